//! The tree itself and its four public operations.

use crate::error::{TreeError, TreeResult};
use crate::node::{Node, ReaderGuard, WriterGuard};
use crate::path;

/// A concurrent, in-memory tree of folders, rooted at `/`.
///
/// Clone a `Tree` behind an `Arc` to share it across threads; `Tree` itself
/// is `Send + Sync` because every node mediates its own access through its
/// [`crate::sync::NodeSync`] protocol.
pub struct Tree {
    root: Box<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a new, empty tree containing only the root folder.
    pub fn new() -> Self {
        log::debug!("created new folder tree");
        Tree { root: Box::new(Node::new()) }
    }

    /// Lists the immediate children of `path`, comma-separated in no
    /// prescribed order, with no trailing comma. Returns `""` for an empty
    /// folder.
    pub fn list(&self, path: &str) -> TreeResult<String> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidArgument);
        }
        let components = path::components(path);
        let guard = self.reader_descend(&components)?;
        let names: Vec<&str> = guard.children().iter().map(|(name, _)| name.as_str()).collect();
        Ok(names.join(","))
    }

    /// Creates an empty folder at `path`. Fails if `path` is the root, if
    /// an intermediate component is missing, or if `path` already exists.
    pub fn create(&self, path: &str) -> TreeResult<()> {
        if !path::is_valid(path) {
            return Err(TreeError::InvalidArgument);
        }
        if path == "/" {
            return Err(TreeError::AlreadyExists);
        }
        let components = path::components(path);
        let (parent_components, name) = components.split_at(components.len() - 1);
        let name = &name[0];

        let parent = self.acquire_writer(parent_components)?;
        let children = parent.children_mut();
        if children.get(name).is_some() {
            return Err(TreeError::AlreadyExists);
        }
        children.insert(name.clone(), Box::new(Node::new()));
        log::trace!("created folder {path:?}");
        Ok(())
    }

    /// Removes the empty folder at `path`. Fails if `path` is the root, if
    /// some component is missing, or if the folder still has children.
    pub fn remove(&self, path: &str) -> TreeResult<()> {
        if path == "/" {
            return Err(TreeError::Busy);
        }
        if !path::is_valid(path) {
            return Err(TreeError::InvalidArgument);
        }
        let components = path::components(path);
        let (parent_components, name) = components.split_at(components.len() - 1);
        let name = &name[0];

        let parent = self.acquire_writer(parent_components)?;
        let victim: &Node = match parent.children().get(name) {
            Some(child) => &**child,
            None => return Err(TreeError::NotFound),
        };

        // Safe to observe quiescence and then read the child count without
        // re-acquiring anything: `parent` is held as a writer for the rest
        // of this function, so nothing can re-enter `victim` in between.
        victim.wait_quiescent();
        if unsafe { victim.children_exclusive().len() } != 0 {
            return Err(TreeError::NotEmpty);
        }

        let removed = parent.children_mut().remove(name).expect("victim was just looked up above");
        drop(removed);
        log::trace!("removed folder {path:?}");
        Ok(())
    }

    /// Moves the folder at `source` to `target`, preserving its subtree.
    ///
    /// `move(p, p)` is a no-op that always succeeds. Moving a folder to a
    /// path strictly inside itself fails with
    /// [`TreeError::MoveIntoOwnSubtree`].
    pub fn mv(&self, source: &str, target: &str) -> TreeResult<()> {
        if source == "/" {
            return Err(TreeError::Busy);
        }
        if target == "/" {
            return Err(TreeError::AlreadyExists);
        }
        if !path::is_valid(source) || !path::is_valid(target) {
            return Err(TreeError::InvalidArgument);
        }
        if path::is_strict_prefix(source, target) {
            return Err(TreeError::MoveIntoOwnSubtree);
        }
        if source == target {
            return Ok(());
        }

        let source_components = path::components(source);
        let target_components = path::components(target);

        // The longest common prefix of `source` and `target` serializes
        // concurrent moves (see the module doc on deadlock-freedom), but it
        // must never be deeper than either operand's own parent: if it
        // were, that operand's parent would sit *above* the lock we are
        // about to take, which a reference C implementation of this
        // protocol gets wrong (a buffer walks off the front of a string in
        // that case) and which this crate avoids by construction. See
        // DESIGN.md's "LCA anchor" entry.
        let common = lca_component_count(&source_components, &target_components);

        let lca_components = &source_components[..common];
        let (source_parent_rel, source_name) = source_components[common..].split_at(source_components.len() - 1 - common);
        let (target_parent_rel, target_name) = target_components[common..].split_at(target_components.len() - 1 - common);
        let source_name = &source_name[0];
        let target_name = &target_name[0];

        let mut lca_guard = Some(self.acquire_writer(lca_components)?);
        let lca_node: &Node = lca_guard.as_ref().unwrap().node();

        let target_is_lca = target_parent_rel.is_empty();
        let mut target_guard: Option<WriterGuard> = None;
        if !target_is_lca {
            target_guard = Some(writer_descend_from(lca_node, target_parent_rel)?);
        }
        let target_parent: &Node = if target_is_lca { lca_node } else { target_guard.as_ref().unwrap().node() };

        let source_is_lca = source_parent_rel.is_empty();
        let mut source_guard: Option<WriterGuard> = None;
        if !source_is_lca {
            source_guard = Some(writer_descend_from(lca_node, source_parent_rel)?);
        }
        let source_parent: &Node = if source_is_lca { lca_node } else { source_guard.as_ref().unwrap().node() };

        // Safety: `target_parent`/`source_parent` are each either the LCA
        // (held as writer by `lca_guard`) or a node we just writer-entered
        // ourselves above.
        if unsafe { target_parent.children_exclusive() }.get(target_name).is_some() {
            return Err(TreeError::AlreadyExists);
        }
        if unsafe { source_parent.children_exclusive() }.get(source_name).is_none() {
            return Err(TreeError::NotFound);
        }

        // The LCA only serializes the search for `source_parent` and
        // `target_parent`; once both are held, structural changes are
        // confined to them, so release the LCA early if it isn't one of
        // them.
        if !target_is_lca && !source_is_lca {
            lca_guard.take();
        }

        let source_node: &Node = unsafe { &**source_parent.children_exclusive().get(source_name).unwrap() };
        source_node.wait_quiescent();

        let mut removed = unsafe { source_parent.children_mut_exclusive() }
            .remove(source_name)
            .expect("checked present above, and source_parent was held as writer throughout");
        let children = removed.take_children();
        let spliced = Box::new(Node::with_children(children));
        unsafe { target_parent.children_mut_exclusive() }.insert(target_name.clone(), spliced);
        drop(removed);

        log::trace!("moved folder {source:?} to {target:?}");
        Ok(())
    }

    /// Hand-over-hand reader descent from the root through `components`.
    /// Releases every guard it acquired before returning on failure.
    fn reader_descend<'t>(&'t self, components: &[String]) -> TreeResult<ReaderGuard<'t>> {
        let mut guard = self.root.read();
        for name in components {
            let child: &'t Node = match guard.children().get(name) {
                Some(child) => &**child,
                None => return Err(TreeError::NotFound),
            };
            guard = child.read(); // enters the child before `guard`'s old value is dropped below
        }
        Ok(guard)
    }

    /// Enters the node named by `components` (relative to the root) as a
    /// writer, reader-descending to its parent first. An empty slice
    /// writer-enters the root itself.
    fn acquire_writer<'t>(&'t self, components: &[String]) -> TreeResult<WriterGuard<'t>> {
        if components.is_empty() {
            return Ok(self.root.write());
        }
        let (parent_components, name) = components.split_at(components.len() - 1);
        let parent_guard = self.reader_descend(parent_components)?;
        let node: &'t Node = match parent_guard.children().get(&name[0]) {
            Some(child) => &**child,
            None => return Err(TreeError::NotFound),
        };
        Ok(node.write())
    }
}

/// Length, in components, of the path that anchors `move`'s lowest-common-
/// ancestor lock for `source_components`/`target_components`.
///
/// This is the longest common prefix of the two component lists, clamped to
/// never exceed either operand's own parent depth (`len - 1`): going deeper
/// would put that operand's parent *above* the node we're about to lock.
/// Whenever neither path is a prefix of the other this clamp never triggers
/// and the result is exactly the literal longest common prefix; see
/// DESIGN.md's "LCA anchor" entry for the degenerate case it exists to
/// avoid.
fn lca_component_count(source_components: &[String], target_components: &[String]) -> usize {
    let max_common = (source_components.len().saturating_sub(1)).min(target_components.len().saturating_sub(1));
    let mut common = 0;
    while common < max_common && source_components[common] == target_components[common] {
        common += 1;
    }
    common
}

/// Writer-descends from `start` (already held as a writer by the caller)
/// along `rel`, a nonempty sequence of component names, returning the final
/// node held as a writer. Every intermediate node is entered as a writer
/// before the previous one is released.
fn writer_descend_from<'t>(start: &'t Node, rel: &[String]) -> TreeResult<WriterGuard<'t>> {
    debug_assert!(!rel.is_empty());
    let mut guard: Option<WriterGuard<'t>> = None;
    for (i, name) in rel.iter().enumerate() {
        let child: &'t Node = {
            // Safety: on the first step `start` is held as writer by the
            // caller; afterwards `guard` holds the writer lock ourselves.
            let map = if i == 0 { unsafe { start.children_exclusive() } } else { guard.as_ref().unwrap().children() };
            match map.get(name) {
                Some(child) => &**child,
                None => return Err(TreeError::NotFound),
            }
        };
        guard = Some(child.write());
    }
    Ok(guard.unwrap())
}
