use std::net::Ipv4Addr;

use dnrd_rib::{Cidr, IntoIpAddr, Ipv4Route, TreeBitMap};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut tree_bitmap = TreeBitMap::new();
    let routes = [
        (0b1111_1111_1111_1111_1111_1111_1111_1100_u32, 30, 1),
        (0b0001_0000_0000_0000_0000_0000_0000_0000_u32, 15, 2),
        (0b1111_1111_1111_1111_1111_1111_1111_0000_u32, 28, 3),
    ];

    for (net, len, hop) in routes {
        let route = Ipv4Route::new(Ipv4Addr::new(10, 0, 0, hop), 100);
        tree_bitmap.insert(net, Cidr::new(len)?, route)?;
    }

    println!("{} routes", tree_bitmap.len());
    for entry in tree_bitmap.iter() {
        println!("{}", entry);
    }

    let addr = 0xffff_ffff_u32;
    match tree_bitmap.longest_match(addr) {
        Some(found) => {
            println!("lookup {}: {}", addr.into_ipaddr(), found)
        }
        None => println!("lookup {}: no route", addr.into_ipaddr()),
    }

    println!("{}", tree_bitmap.stats());
    Ok(())
}
