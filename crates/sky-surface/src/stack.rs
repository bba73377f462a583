//! Explicit presentation stack for browser surfaces.
//!
//! Surfaces form a linked chain from the root (primary) surface through each
//! presented surface. The walk to the topmost surface is a pure traversal of
//! that chain rather than implicit platform state.

/// What a surface is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Primary,
    ExternalBrowser,
}

impl SurfaceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::ExternalBrowser => "external-browser",
        }
    }
}

/// One embedded browser surface in the presentation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub id: u64,
    pub kind: SurfaceKind,
    pub url: String,
    pub full_screen: bool,
    presented: Option<Box<Surface>>,
}

impl Surface {
    pub fn primary(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            kind: SurfaceKind::Primary,
            url: url.into(),
            full_screen: true,
            presented: None,
        }
    }

    pub fn external_browser(id: u64, url: impl Into<String>) -> Self {
        Self {
            id,
            kind: SurfaceKind::ExternalBrowser,
            url: url.into(),
            full_screen: true,
            presented: None,
        }
    }

    pub fn presented(&self) -> Option<&Surface> {
        self.presented.as_deref()
    }

    /// Number of surfaces in the chain, the root included.
    pub fn depth(&self) -> usize {
        let mut depth = 1_usize;
        let mut cursor = self;
        while let Some(next) = cursor.presented() {
            depth = depth.saturating_add(1);
            cursor = next;
        }
        depth
    }

    /// Stacks a surface on top of whatever is currently topmost.
    pub fn present_on_topmost(&mut self, surface: Surface) {
        match self.presented.as_deref_mut() {
            Some(next) => next.present_on_topmost(surface),
            None => self.presented = Some(Box::new(surface)),
        }
    }

    /// Removes and returns the deepest presented surface, if any.
    ///
    /// The root surface is never dismissed.
    pub fn dismiss_topmost(&mut self) -> Option<Surface> {
        let next_has_child = self
            .presented
            .as_deref()
            .is_some_and(|next| next.presented.is_some());

        if next_has_child {
            self.presented
                .as_deref_mut()
                .and_then(Surface::dismiss_topmost)
        } else {
            self.presented.take().map(|boxed| *boxed)
        }
    }

    /// Surfaces from the root to the topmost, in presentation order.
    pub fn chain(&self) -> Vec<&Surface> {
        let mut out = Vec::with_capacity(self.depth());
        let mut cursor = Some(self);
        while let Some(surface) = cursor {
            out.push(surface);
            cursor = surface.presented();
        }
        out
    }
}

/// Walks the presented chain from the root and returns the topmost surface.
pub fn topmost(root: &Surface) -> &Surface {
    let mut cursor = root;
    while let Some(next) = cursor.presented() {
        cursor = next;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::Surface;
    use super::SurfaceKind;
    use super::topmost;

    #[test]
    fn topmost_of_a_lone_root_is_the_root() {
        let root = Surface::primary(1, "http://127.0.0.1:8080/");
        assert_eq!(topmost(&root).id, 1);
        assert_eq!(root.depth(), 1);
    }

    #[test]
    fn present_stacks_on_the_current_topmost() {
        let mut root = Surface::primary(1, "http://127.0.0.1:8080/");
        root.present_on_topmost(Surface::external_browser(2, "https://example.com/"));
        root.present_on_topmost(Surface::external_browser(3, "https://example.org/"));

        assert_eq!(root.depth(), 3);
        let top = topmost(&root);
        assert_eq!(top.id, 3);
        assert_eq!(top.kind, SurfaceKind::ExternalBrowser);
        assert!(top.full_screen);

        let ids: Vec<u64> = root.chain().iter().map(|surface| surface.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn dismiss_pops_the_deepest_presented_surface() {
        let mut root = Surface::primary(1, "http://127.0.0.1:8080/");
        root.present_on_topmost(Surface::external_browser(2, "https://example.com/"));
        root.present_on_topmost(Surface::external_browser(3, "https://example.org/"));

        let popped = root.dismiss_topmost();
        assert!(popped.is_some_and(|surface| surface.id == 3));
        assert_eq!(topmost(&root).id, 2);

        let popped = root.dismiss_topmost();
        assert!(popped.is_some_and(|surface| surface.id == 2));
        assert_eq!(topmost(&root).id, 1);

        assert_eq!(root.dismiss_topmost(), None);
        assert_eq!(root.depth(), 1);
    }
}
