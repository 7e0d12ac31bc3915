//! Depth-first AST traversal with mutation support.
//!
//! The callback sees each node with its visit key and the path of keys from
//! the root, and steers traversal through the returned [`Visit`] variant.
//! Removing or replacing nodes during traversal is supported; `Jump`
//! redirects iteration within the current collection.

use smallvec::SmallVec;

use crate::node::Node;

/// Where a visited node sits relative to its parent.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VisitKey {
    /// The root node.
    Root,
    /// Index within a sequence, or the pair index within a mapping.
    Index(usize),
    /// The key side of a mapping pair.
    Key,
    /// The value side of a mapping pair.
    Value,
}

/// Traversal control returned by a visitor callback.
#[derive(Debug)]
pub enum Visit {
    /// Descend into children and continue.
    Continue,
    /// Skip this node's children.
    Skip,
    /// Abort the whole traversal.
    Break,
    /// Delete this node (for pair children, the whole pair) and continue at
    /// the same index.
    Remove,
    /// Replace this node and visit the replacement.
    Replace(Node),
    /// Continue iteration of the current collection at this index.
    Jump(usize),
}

enum Outcome {
    Continue,
    Break,
    Remove,
    Jump(usize),
}

/// Walk `node` depth-first, calling `visitor` for every node.
///
/// Inside mappings each pair contributes its index to the path, followed by
/// [`VisitKey::Key`] or [`VisitKey::Value`] for the visited side.
pub fn visit<F>(node: &mut Node, visitor: &mut F)
where
    F: FnMut(VisitKey, &mut Node, &[VisitKey]) -> Visit,
{
    let mut path: SmallVec<[VisitKey; 8]> = SmallVec::new();
    let _ = walk(visitor, VisitKey::Root, node, &mut path);
}

fn walk<F>(f: &mut F, key: VisitKey, node: &mut Node, path: &mut SmallVec<[VisitKey; 8]>) -> Outcome
where
    F: FnMut(VisitKey, &mut Node, &[VisitKey]) -> Visit,
{
    match f(key, node, path) {
        Visit::Break => return Outcome::Break,
        Visit::Remove => return Outcome::Remove,
        Visit::Jump(i) => return Outcome::Jump(i),
        Visit::Skip => return Outcome::Continue,
        Visit::Replace(new) => {
            *node = new;
            return walk(f, key, node, path);
        }
        Visit::Continue => {}
    }
    match node {
        Node::Scalar(_) | Node::Alias(_) => Outcome::Continue,
        Node::Seq(seq) => {
            let mut i = 0;
            while i < seq.items.len() {
                path.push(VisitKey::Index(i));
                let outcome = walk(f, VisitKey::Index(i), &mut seq.items[i], path);
                path.pop();
                match outcome {
                    Outcome::Break => return Outcome::Break,
                    Outcome::Remove => {
                        seq.items.remove(i);
                    }
                    Outcome::Jump(j) => i = j,
                    Outcome::Continue => i += 1,
                }
            }
            Outcome::Continue
        }
        Node::Map(map) => {
            let mut i = 0;
            'pairs: while i < map.items.len() {
                for side in [VisitKey::Key, VisitKey::Value] {
                    let child = match side {
                        VisitKey::Key => map.items[i].key.as_mut(),
                        _ => map.items[i].value.as_mut(),
                    };
                    let Some(child) = child else { continue };
                    path.push(VisitKey::Index(i));
                    path.push(side);
                    let outcome = walk(f, side, child, path);
                    path.pop();
                    path.pop();
                    match outcome {
                        Outcome::Break => return Outcome::Break,
                        Outcome::Remove => {
                            map.items.remove(i);
                            continue 'pairs;
                        }
                        Outcome::Jump(j) => {
                            i = j;
                            continue 'pairs;
                        }
                        Outcome::Continue => {}
                    }
                }
                i += 1;
            }
            Outcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Map, Pair, Scalar, Seq};
    use crate::value::Value;

    fn sample_seq() -> Node {
        Node::Seq(Seq {
            items: vec![Node::scalar(1i64), Node::scalar(2i64), Node::scalar(3i64)],
            ..Seq::default()
        })
    }

    #[test]
    fn visits_every_node_once() {
        let mut node = Node::Map(Map {
            items: vec![
                Pair::new(Some(Node::scalar("a")), Some(sample_seq())),
                Pair::new(Some(Node::scalar("b")), Some(Node::scalar(true))),
            ],
            ..Map::default()
        });
        let mut count = 0;
        visit(&mut node, &mut |_, _, _| {
            count += 1;
            Visit::Continue
        });
        // map + 2 keys + seq + 3 items + bool
        assert_eq!(count, 8);
    }

    #[test]
    fn skip_prunes_children() {
        let mut node = Node::Map(Map {
            items: vec![Pair::new(Some(Node::scalar("a")), Some(sample_seq()))],
            ..Map::default()
        });
        let mut count = 0;
        visit(&mut node, &mut |_, n, _| {
            count += 1;
            if matches!(n, Node::Seq(_)) {
                Visit::Skip
            } else {
                Visit::Continue
            }
        });
        // map + key + seq, not the three items
        assert_eq!(count, 3);
    }

    #[test]
    fn break_aborts() {
        let mut node = sample_seq();
        let mut count = 0;
        visit(&mut node, &mut |_, _, _| {
            count += 1;
            if count == 2 {
                Visit::Break
            } else {
                Visit::Continue
            }
        });
        assert_eq!(count, 2);
    }

    #[test]
    fn remove_deletes_and_continues_at_same_index() {
        let mut node = sample_seq();
        visit(&mut node, &mut |_, n, _| {
            if n.as_scalar().is_some_and(|s| s.value == Value::Int(2)) {
                Visit::Remove
            } else {
                Visit::Continue
            }
        });
        let seq = node.as_seq().unwrap();
        assert_eq!(seq.items.len(), 2);
        assert_eq!(seq.items[1].as_scalar().unwrap().value, Value::Int(3));
    }

    #[test]
    fn replace_revisits_the_new_node() {
        let mut node = sample_seq();
        let mut saw_replacement = false;
        visit(&mut node, &mut |_, n, _| {
            if let Some(s) = n.as_scalar() {
                if s.value == Value::Int(2) {
                    return Visit::Replace(Node::Scalar(Scalar::new("two")));
                }
                if s.value == Value::String("two".to_string()) {
                    saw_replacement = true;
                }
            }
            Visit::Continue
        });
        assert!(saw_replacement);
        assert_eq!(
            node.as_seq().unwrap().items[1].as_scalar().unwrap().value,
            Value::String("two".to_string())
        );
    }

    #[test]
    fn jump_redirects_iteration() {
        let mut node = sample_seq();
        let mut visited = Vec::new();
        let mut jumped = false;
        visit(&mut node, &mut |key, n, _| {
            if let Some(s) = n.as_scalar() {
                visited.push(s.value.clone());
            }
            if key == VisitKey::Index(0) && !jumped {
                jumped = true;
                return Visit::Jump(2);
            }
            Visit::Continue
        });
        assert_eq!(
            visited,
            vec![Value::Int(1), Value::Int(3)],
            "index 1 is skipped by the jump"
        );
    }

    #[test]
    fn paths_identify_ancestry() {
        let mut node = Node::Map(Map {
            items: vec![Pair::new(Some(Node::scalar("a")), Some(sample_seq()))],
            ..Map::default()
        });
        let mut deepest = Vec::new();
        visit(&mut node, &mut |_, n, path| {
            if n.as_scalar().is_some_and(|s| s.value == Value::Int(3)) {
                deepest = path.to_vec();
            }
            Visit::Continue
        });
        assert_eq!(
            deepest,
            vec![VisitKey::Index(0), VisitKey::Value, VisitKey::Index(2)]
        );
    }
}
