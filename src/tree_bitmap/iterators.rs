use crate::tree_bitmap::tree_bitmap_node::CHILDREN;
use crate::tree_bitmap::TreeBitMapNode;
use crate::types::af::{nibble_into_net, IPv4};
use crate::types::bit_span::SLOTS;
use crate::types::{BitSpan, PrefixId, RouteEntry};

//------------ Iter ----------------------------------------------------------

// A depth-first walk over the tree, one stack frame per node on the path
// from the root to the node that is currently being visited.
//
// The cursor of a frame runs over the slots of the node first (0..15), and
// then over its children (15..23). A slot with its bit set produces an item,
// a child with its bit set gets a frame of its own pushed on top of the
// stack. A frame is popped when its cursor is exhausted.
//
// The base of a frame is the address formed by the nibbles on the path to
// its node, from which the prefixes in the node are rebuilt.

struct Frame<'a, P> {
    node: &'a TreeBitMapNode<P>,
    base: IPv4,
    depth: u8,
    cursor: u8,
}

/// An iterator over all prefixes in a [crate::TreeBitMap], and their routes.
pub struct Iter<'a, P> {
    stack: Vec<Frame<'a, P>>,
    remaining: usize,
}

impl<'a, P> Iter<'a, P> {
    pub(crate) fn new(root: &'a TreeBitMapNode<P>, count: usize) -> Self {
        Iter {
            stack: vec![Frame {
                node: root,
                base: 0,
                depth: 0,
                cursor: 0,
            }],
            remaining: count,
        }
    }
}

impl<'a, P> Iterator for Iter<'a, P> {
    type Item = RouteEntry<'a, P>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            let node = frame.node;
            let cursor = frame.cursor as usize;

            if cursor < SLOTS {
                frame.cursor += 1;
                let bit_span = BitSpan::from_slot(cursor as u8);
                if let Some(route) = node.prefix(bit_span) {
                    self.remaining = self.remaining.saturating_sub(1);
                    return Some(RouteEntry {
                        prefix: PrefixId::from_bit_span(
                            frame.base,
                            frame.depth,
                            bit_span,
                        ),
                        route,
                    });
                }
            } else if cursor < SLOTS + CHILDREN {
                frame.cursor += 1;
                let nibble = (cursor - SLOTS) as u8;
                if let Some(child) = node.child(nibble) {
                    let child_frame = Frame {
                        node: child,
                        base: frame.base | nibble_into_net(nibble, frame.depth),
                        depth: frame.depth + 1,
                        cursor: 0,
                    };
                    self.stack.push(child_frame);
                }
            } else {
                self.stack.pop();
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<P> ExactSizeIterator for Iter<'_, P> {}

impl<P> std::iter::FusedIterator for Iter<'_, P> {}
