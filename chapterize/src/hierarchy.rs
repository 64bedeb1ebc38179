//! Decomposition of a flat heading stream into a section tree
//!
//! The builder keeps a stack of open sections indexed by depth. A heading at
//! depth `d` closes every open section at depth `>= d`, then opens a new one
//! under whatever remains on top. Content always lands in the innermost open
//! section, or in the root before the first heading.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::order_key::{OrderKey, DEFAULT_ORDER_CODE_DEPTH};
use crate::slug::slug_or_untitled;
use serde::Serialize;

/// Deepest heading level that opens its own section by default
pub const DEFAULT_SPLIT_DEPTH: usize = 3;

/// A heading as handed to the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeading {
    /// 1-based depth
    pub depth: usize,
    /// Key recovered from the visible number; empty means document order
    pub order_key: OrderKey,
    /// Visible number as rendered or written, may be empty
    pub number: String,
    /// Title without its number
    pub title: String,
    /// Number spelled with a letter (`Приложение Б`, `A.1`)
    pub lettered: bool,
    /// Problems found while recognizing this heading
    pub diagnostics: Vec<Diagnostic>,
}

impl SectionHeading {
    pub fn new(depth: usize, order_key: OrderKey, number: &str, title: &str) -> Self {
        Self {
            depth,
            order_key,
            number: number.to_string(),
            title: title.to_string(),
            lettered: false,
            diagnostics: Vec::new(),
        }
    }

    /// Mark the number as letter-based
    pub fn lettered(mut self, lettered: bool) -> Self {
        self.lettered = lettered;
        self
    }
}

/// One node of the section tree
///
/// The root is synthetic: depth 0, empty key and title. Its content is the
/// preamble that precedes the first heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = ""))]
pub struct SectionNode<B> {
    pub order_key: OrderKey,
    pub depth: usize,
    pub title: String,
    /// Visible number, kept for rendering headings back
    pub number: String,
    /// Fixed-width code of `order_key`
    pub order_code: String,
    #[serde(skip)]
    pub content_blocks: Vec<B>,
    pub children: Vec<SectionNode<B>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl<B> SectionNode<B> {
    fn root() -> Self {
        Self {
            order_key: OrderKey::default(),
            depth: 0,
            title: String::new(),
            number: String::new(),
            order_code: String::new(),
            content_blocks: Vec::new(),
            children: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    pub fn has_content(&self) -> bool {
        !self.content_blocks.is_empty()
    }

    /// Folder or file name (without extension) of this section
    pub fn name(&self, slug_max_len: usize) -> String {
        let slug = slug_or_untitled([self.title.as_str(), self.number.as_str()], slug_max_len);
        section_name(&self.order_code, &slug)
    }

    /// Depth-first iterator over this node and all its descendants
    pub fn walk(&self) -> impl Iterator<Item = &SectionNode<B>> {
        let mut pending = vec![self];
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            pending.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

/// Name shared by folders and files: `<orderCode>.<slug>`
pub fn section_name(order_code: &str, slug: &str) -> String {
    format!("{}.{}", order_code, slug)
}

/// Result of one decomposition pass
#[derive(Debug, Clone)]
pub struct Hierarchy<B> {
    pub root: SectionNode<B>,
    pub diagnostics: Vec<Diagnostic>,
}

struct OpenSection<B> {
    node: SectionNode<B>,
    /// Highest child component seen so far, for numberless children
    last_child: Option<u32>,
}

impl<B> OpenSection<B> {
    fn new(node: SectionNode<B>) -> Self {
        Self {
            node,
            last_child: None,
        }
    }

    fn note_child(&mut self, key: &OrderKey, child_depth: usize) {
        if let Some(&component) = key.parts.get(child_depth - 1) {
            self.last_child = Some(self.last_child.map_or(component, |l| l.max(component)));
        }
    }
}

/// Builds the section tree in one left-to-right pass
///
/// Headings deeper than the split depth do not open sections; they are
/// converted into content blocks of the innermost open section.
pub struct HierarchyBuilder<B> {
    split_depth: usize,
    order_code_depth: usize,
    /// `open[0]` is the root; depths strictly increase towards the top
    open: Vec<OpenSection<B>>,
    /// Key of the previous top-level section and whether it was lettered
    last_top_level: Option<(OrderKey, bool)>,
    diagnostics: Diagnostics,
}

impl<B: From<SectionHeading>> Default for HierarchyBuilder<B> {
    fn default() -> Self {
        Self::new(DEFAULT_SPLIT_DEPTH, DEFAULT_ORDER_CODE_DEPTH)
    }
}

impl<B: From<SectionHeading>> HierarchyBuilder<B> {
    /// Create a builder with a fresh, empty tree
    ///
    /// # Parameters
    /// * `split_depth` - Deepest heading level that opens its own section (at least 1)
    /// * `order_code_depth` - Number of key components encoded in order codes
    pub fn new(split_depth: usize, order_code_depth: usize) -> Self {
        Self {
            split_depth: split_depth.max(1),
            order_code_depth,
            open: vec![OpenSection::new(SectionNode::root())],
            last_top_level: None,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn split_depth(&self) -> usize {
        self.split_depth
    }

    /// Feed one heading
    pub fn push_heading(&mut self, heading: SectionHeading) {
        if heading.depth > self.split_depth || heading.depth == 0 {
            for diagnostic in &heading.diagnostics {
                self.diagnostics.push(diagnostic.clone());
            }
            self.push_content(B::from(heading));
            return;
        }

        let SectionHeading {
            depth,
            order_key,
            number,
            title,
            lettered,
            diagnostics: mut node_diagnostics,
        } = heading;

        self.close_from(depth);

        let parent = self.innermost();
        let parent_depth = parent.node.depth;
        let parent_key = parent.node.order_key.clone();

        if parent_depth + 1 != depth {
            node_diagnostics.push(Diagnostic::MissingParent {
                title: title.clone(),
                depth,
            });
        }

        let order_key = if order_key.is_empty() {
            let next = parent.last_child.map_or(1, |last| last.saturating_add(1));
            let key = parent_key.child(depth - 1, next);
            log::debug!("'{}' has no explicit number, using {}", title, key);
            key
        } else {
            if let Some(violation) =
                self.check_order(depth, &title, &order_key, lettered, parent_depth, &parent_key)
            {
                node_diagnostics.push(violation);
            }
            order_key
        };

        if order_key.overflows_code(self.order_code_depth) {
            node_diagnostics.push(Diagnostic::OrderCodeOverflow {
                title: title.clone(),
                order_key: order_key.clone(),
            });
        }

        if depth == 1 {
            self.last_top_level = Some((order_key.clone(), lettered));
        }
        self.innermost_mut().note_child(&order_key, depth);

        for diagnostic in &node_diagnostics {
            self.diagnostics.push(diagnostic.clone());
        }

        let order_code = order_key.order_code(self.order_code_depth);
        self.open.push(OpenSection::new(SectionNode {
            order_key,
            depth,
            title,
            number,
            order_code,
            content_blocks: Vec::new(),
            children: Vec::new(),
            diagnostics: node_diagnostics,
        }));
    }

    /// Feed one content block
    pub fn push_content(&mut self, block: B) {
        self.innermost_mut().node.content_blocks.push(block);
    }

    /// Close every open section and return the tree
    pub fn finish(mut self) -> Hierarchy<B> {
        self.close_from(1);
        let root = match self.open.pop() {
            Some(open) => open.node,
            None => SectionNode::root(),
        };
        Hierarchy {
            root,
            diagnostics: self.diagnostics.into_vec(),
        }
    }

    /// Numbers must continue the open parent; top-level numbers must increase
    ///
    /// The first lettered top-level heading after numeric ones (appendix A
    /// after chapter 5) starts a new series and is not compared.
    fn check_order(
        &self,
        depth: usize,
        title: &str,
        order_key: &OrderKey,
        lettered: bool,
        parent_depth: usize,
        parent_key: &OrderKey,
    ) -> Option<Diagnostic> {
        if depth == 1 {
            let (previous, previous_lettered) = self.last_top_level.as_ref()?;
            if lettered && !previous_lettered {
                return None;
            }
            let increases = match (order_key.first(), previous.first()) {
                (Some(current), Some(last)) => current > last,
                _ => true,
            };
            return (!increases).then(|| Diagnostic::OrderingViolation {
                title: title.to_string(),
                order_key: order_key.clone(),
                parent_key: previous.clone(),
            });
        }

        if parent_depth == 0 || parent_key.is_empty() {
            return None;
        }
        (!order_key.extends(parent_key, depth - 1)).then(|| Diagnostic::OrderingViolation {
            title: title.to_string(),
            order_key: order_key.clone(),
            parent_key: parent_key.clone(),
        })
    }

    /// Attach every open section at `depth` or deeper to its parent
    fn close_from(&mut self, depth: usize) {
        while self.open.len() > 1 && self.innermost().node.depth >= depth {
            if let Some(closed) = self.open.pop() {
                self.innermost_mut().node.children.push(closed.node);
            }
        }
    }

    fn innermost(&self) -> &OpenSection<B> {
        // The root is pushed in `new` and never popped before `finish`
        &self.open[self.open.len() - 1]
    }

    fn innermost_mut(&mut self) -> &mut OpenSection<B> {
        let last = self.open.len() - 1;
        &mut self.open[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Block {
        Text(String),
        Heading(usize, String),
    }

    impl From<SectionHeading> for Block {
        fn from(heading: SectionHeading) -> Self {
            Block::Heading(heading.depth, heading.title)
        }
    }

    fn heading(depth: usize, key: &[u32], title: &str) -> SectionHeading {
        SectionHeading::new(depth, OrderKey::new(key.to_vec()), "", title)
    }

    fn codes(node: &SectionNode<Block>) -> Vec<(usize, String, String)> {
        node.walk()
            .filter(|n| !n.is_root())
            .map(|n| (n.depth, n.order_code.clone(), n.title.clone()))
            .collect()
    }

    #[test]
    fn test_chapters_and_sections() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[1], "Введение"));
        builder.push_heading(heading(2, &[1, 1], "Общее"));
        builder.push_content(Block::Text("текст".to_string()));
        builder.push_heading(heading(1, &[2], "Архитектура"));
        let tree = builder.finish();

        assert!(tree.diagnostics.is_empty());
        assert_eq!(tree.root.children.len(), 2);
        assert_eq!(tree.root.children[0].children.len(), 1);
        assert!(tree.root.children[1].children.is_empty());
        assert_eq!(
            codes(&tree.root),
            vec![
                (1, "010000".to_string(), "Введение".to_string()),
                (2, "010100".to_string(), "Общее".to_string()),
                (1, "020000".to_string(), "Архитектура".to_string()),
            ]
        );
        assert_eq!(
            tree.root.children[0].children[0].content_blocks,
            vec![Block::Text("текст".to_string())]
        );
    }

    #[test]
    fn test_content_goes_to_innermost_section() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_content(Block::Text("преамбула".to_string()));
        builder.push_heading(heading(1, &[1], "Глава"));
        builder.push_content(Block::Text("глава".to_string()));
        builder.push_heading(heading(2, &[1, 1], "Раздел"));
        builder.push_content(Block::Text("вступление".to_string()));
        builder.push_heading(heading(3, &[1, 1, 1], "Пункт"));
        builder.push_content(Block::Text("пункт".to_string()));
        let tree = builder.finish();

        assert_eq!(tree.root.content_blocks, vec![Block::Text("преамбула".to_string())]);
        let chapter = &tree.root.children[0];
        assert_eq!(chapter.content_blocks, vec![Block::Text("глава".to_string())]);
        let section = &chapter.children[0];
        assert_eq!(section.content_blocks, vec![Block::Text("вступление".to_string())]);
        assert_eq!(section.children[0].order_code, "010101");
        assert_eq!(section.children[0].content_blocks, vec![Block::Text("пункт".to_string())]);
    }

    #[test]
    fn test_deeper_headings_become_content() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[1], "Глава"));
        builder.push_heading(heading(2, &[1, 1], "Раздел"));
        builder.push_heading(heading(3, &[1, 1, 1], "Пункт"));
        builder.push_heading(heading(4, &[1, 1, 1, 1], "Подпункт"));
        let tree = builder.finish();

        let item = &tree.root.children[0].children[0].children[0];
        assert!(item.children.is_empty());
        assert_eq!(item.content_blocks, vec![Block::Heading(4, "Подпункт".to_string())]);
    }

    #[test]
    fn test_split_depth_is_configurable() {
        let mut builder = HierarchyBuilder::<Block>::new(4, 4);
        builder.push_heading(heading(1, &[1], "Глава"));
        builder.push_heading(heading(2, &[1, 1], "Раздел"));
        builder.push_heading(heading(3, &[1, 1, 1], "Пункт"));
        builder.push_heading(heading(4, &[1, 1, 1, 2], "Подпункт"));
        let tree = builder.finish();

        let deepest = &tree.root.children[0].children[0].children[0].children[0];
        assert_eq!(deepest.order_code, "01010102");
    }

    #[test]
    fn test_numberless_headings_follow_siblings() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[], "Аннотация"));
        builder.push_heading(heading(1, &[], "Общие положения"));
        builder.push_heading(heading(2, &[], "Назначение"));
        builder.push_heading(heading(2, &[2, 5], "Состав"));
        builder.push_heading(heading(2, &[], "Термины"));
        let tree = builder.finish();

        assert_eq!(
            codes(&tree.root),
            vec![
                (1, "010000".to_string(), "Аннотация".to_string()),
                (1, "020000".to_string(), "Общие положения".to_string()),
                (2, "020100".to_string(), "Назначение".to_string()),
                (2, "020500".to_string(), "Состав".to_string()),
                (2, "020600".to_string(), "Термины".to_string()),
            ]
        );
    }

    #[test]
    fn test_ordering_violation_keeps_own_key() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[2], "Архитектура"));
        builder.push_heading(heading(2, &[3, 1], "Компоненты"));
        let tree = builder.finish();

        let section = &tree.root.children[0].children[0];
        assert_eq!(section.order_code, "030100");
        assert_eq!(section.diagnostics.len(), 1);
        assert_eq!(
            tree.diagnostics,
            vec![Diagnostic::OrderingViolation {
                title: "Компоненты".to_string(),
                order_key: OrderKey::new(vec![3, 1]),
                parent_key: OrderKey::new(vec![2]),
            }]
        );
    }

    #[test]
    fn test_top_level_must_increase() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[2], "Второй"));
        builder.push_heading(heading(1, &[2], "Снова второй"));
        builder.push_heading(heading(1, &[3], "Третий"));
        let tree = builder.finish();

        assert_eq!(tree.diagnostics.len(), 1);
        assert!(matches!(
            &tree.diagnostics[0],
            Diagnostic::OrderingViolation { title, .. } if title == "Снова второй"
        ));
    }

    #[test]
    fn test_appendices_start_a_new_series() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[1], "Введение"));
        builder.push_heading(heading(1, &[2], "Архитектура"));
        builder.push_heading(heading(1, &[1], "Параметры").lettered(true));
        builder.push_heading(heading(1, &[2], "Протоколы").lettered(true));
        builder.push_heading(heading(1, &[2], "Повтор").lettered(true));
        let tree = builder.finish();

        assert_eq!(tree.root.children.len(), 5);
        assert_eq!(tree.diagnostics.len(), 1);
        assert!(matches!(
            &tree.diagnostics[0],
            Diagnostic::OrderingViolation { title, .. } if title == "Повтор"
        ));
    }

    #[test]
    fn test_large_numbers_are_clamped_and_reported() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[2024], "Отчёт"));
        let tree = builder.finish();

        assert_eq!(tree.root.children[0].order_code, "990000");
        assert_eq!(
            tree.diagnostics,
            vec![Diagnostic::OrderCodeOverflow {
                title: "Отчёт".to_string(),
                order_key: OrderKey::new(vec![2024]),
            }]
        );
    }

    #[test]
    fn test_missing_parent() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(2, &[], "Сирота"));
        builder.push_heading(heading(1, &[1], "Глава"));
        builder.push_heading(heading(3, &[], "Пропуск"));
        let tree = builder.finish();

        assert_eq!(tree.root.children.len(), 2);
        assert_eq!(tree.root.children[0].depth, 2);
        assert_eq!(tree.root.children[1].children[0].order_code, "010001");
        assert_eq!(
            tree.diagnostics,
            vec![
                Diagnostic::MissingParent {
                    title: "Сирота".to_string(),
                    depth: 2
                },
                Diagnostic::MissingParent {
                    title: "Пропуск".to_string(),
                    depth: 3
                },
            ]
        );
    }

    #[test]
    fn test_heading_diagnostics_are_attached() {
        let mut builder = HierarchyBuilder::<Block>::default();
        let mut h = heading(1, &[1], "Назначение");
        h.diagnostics.push(Diagnostic::DoubleNumberedTitle {
            token: "1".to_string(),
            title: "Назначение".to_string(),
        });
        builder.push_heading(h);
        let tree = builder.finish();

        assert_eq!(tree.root.children[0].diagnostics.len(), 1);
        assert_eq!(tree.diagnostics.len(), 1);
    }

    #[test]
    fn test_names() {
        let mut builder = HierarchyBuilder::<Block>::default();
        builder.push_heading(heading(1, &[1], "Введение"));
        builder.push_heading(SectionHeading::new(1, OrderKey::new(vec![2]), "Приложение Б", ""));
        let tree = builder.finish();

        assert_eq!(tree.root.children[0].name(60), "010000.vvedenie");
        assert_eq!(tree.root.children[1].name(60), "020000.prilozhenie-b");
        assert_eq!(section_name("020100", "obshchee"), "020100.obshchee");
    }
}
