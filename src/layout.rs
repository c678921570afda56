//! Dashboard layout and the drag-and-drop resolver.
//!
//! A layout is an ordered list of sections, each an ordered list of slots.
//! Every function in this module is pure: it takes the current layout by
//! reference and returns a new value, leaving the input untouched. Indices
//! that do not address an existing section or item yield a [`LayoutError`].
//!
//! Sections emptied by a move or removal are pruned. When a destination
//! section index is given in coordinates that predate such a pruning, it is
//! shifted down by one if it lies after the pruned section.

use serde::{Deserialize, Serialize};

use crate::widget::ObjRef;

/// Width of a layout slot, in grid columns.
pub const DEFAULT_ITEM_WIDTH: u8 = 6;

/// Optional title and description shown above a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single slot. `widget: None` is a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Grid columns taken by the slot.
    pub width: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<ObjRef>,
}

impl LayoutItem {
    /// A default-width slot holding `widget`.
    pub fn widget(widget: impl Into<ObjRef>) -> Self {
        Self {
            width: DEFAULT_ITEM_WIDTH,
            widget: Some(widget.into()),
        }
    }

    /// A default-width empty slot.
    pub fn placeholder() -> Self {
        Self {
            width: DEFAULT_ITEM_WIDTH,
            widget: None,
        }
    }
}

/// A row of slots with an optional header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<SectionHeader>,
    #[serde(default)]
    pub items: Vec<LayoutItem>,
}

impl LayoutSection {
    /// A headerless section holding `items`.
    pub fn with_items(items: Vec<LayoutItem>) -> Self {
        Self {
            header: None,
            items,
        }
    }
}

/// The ordered sections of a dashboard.
///
/// Sections and slots are addressed by index. Resolver functions never
/// leave an empty section behind, but a layout read from disk may hold one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    #[serde(default)]
    pub sections: Vec<LayoutSection>,
}

impl Layout {
    /// Build a layout of widget-only slots, one inner vec per section.
    ///
    /// # Examples
    ///
    /// ```
    /// use dashfold::Layout;
    ///
    /// let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]);
    /// assert_eq!(layout.sections.len(), 2);
    /// assert_eq!(layout.sections[1].items.len(), 2);
    /// ```
    pub fn from_widgets<R: Into<ObjRef>>(sections: Vec<Vec<R>>) -> Self {
        Self {
            sections: sections
                .into_iter()
                .map(|items| {
                    LayoutSection::with_items(items.into_iter().map(LayoutItem::widget).collect())
                })
                .collect(),
        }
    }

    /// Widget references in layout order, placeholders skipped.
    pub fn widget_refs(&self) -> impl Iterator<Item = &ObjRef> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .filter_map(|item| item.widget.as_ref())
    }

    /// `(section, item)` coordinates of the slot holding `widget`.
    pub fn position_of(&self, widget: &ObjRef) -> Option<(usize, usize)> {
        self.sections.iter().enumerate().find_map(|(s, section)| {
            section
                .items
                .iter()
                .position(|item| item.widget.as_ref() == Some(widget))
                .map(|i| (s, i))
        })
    }

    /// The slot at `(section, item)`, if both indices are in range.
    pub fn item(&self, section: usize, item: usize) -> Option<&LayoutItem> {
        self.sections.get(section)?.items.get(item)
    }

    /// Shorthand view of the layout as widget ids, `"_"` for placeholders.
    pub fn to_widget_ids(&self) -> Vec<Vec<String>> {
        self.sections
            .iter()
            .map(|s| {
                s.items
                    .iter()
                    .map(|item| {
                        item.widget
                            .as_ref()
                            .map_or_else(|| "_".to_string(), |w| w.to_string())
                    })
                    .collect()
            })
            .collect()
    }
}

/// An index did not address an existing section, item, or insertion point.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("section index {index} is out of range (layout has {len} sections)")]
    SectionOutOfRange { index: usize, len: usize },

    #[error("item index {index} is out of range for section {section} ({len} items)")]
    ItemOutOfRange {
        section: usize,
        index: usize,
        len: usize,
    },
}

fn check_section(layout: &Layout, index: usize) -> Result<(), LayoutError> {
    if index >= layout.sections.len() {
        return Err(LayoutError::SectionOutOfRange {
            index,
            len: layout.sections.len(),
        });
    }
    Ok(())
}

fn check_section_insertion(layout: &Layout, index: usize) -> Result<(), LayoutError> {
    if index > layout.sections.len() {
        return Err(LayoutError::SectionOutOfRange {
            index,
            len: layout.sections.len(),
        });
    }
    Ok(())
}

fn check_item(layout: &Layout, section: usize, index: usize) -> Result<(), LayoutError> {
    check_section(layout, section)?;
    let len = layout.sections[section].items.len();
    if index >= len {
        return Err(LayoutError::ItemOutOfRange {
            section,
            index,
            len,
        });
    }
    Ok(())
}

/// Move an item out of its section into a brand new section.
///
/// The new section holds only the moved item and is inserted at
/// `to_section`, expressed in coordinates of the input layout. When the
/// source section is left empty it is deleted, and a `to_section` lying
/// after it is decremented by one.
///
/// # Errors
///
/// [`LayoutError`] if the source item does not exist or `to_section` is
/// past the end of the layout.
///
/// # Examples
///
/// ```
/// use dashfold::{Layout, move_item_to_new_section};
///
/// let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]);
/// let moved = move_item_to_new_section(&layout, 1, 1, 0).unwrap();
/// assert_eq!(
///     moved.to_widget_ids(),
///     vec![vec!["w3"], vec!["w1"], vec!["w2"]]
/// );
/// ```
pub fn move_item_to_new_section(
    layout: &Layout,
    from_section: usize,
    from_item: usize,
    to_section: usize,
) -> Result<Layout, LayoutError> {
    check_item(layout, from_section, from_item)?;
    check_section_insertion(layout, to_section)?;

    let mut sections = layout.sections.clone();
    let item = sections[from_section].items.remove(from_item);

    let mut target = to_section;
    if sections[from_section].items.is_empty() {
        sections.remove(from_section);
        if target > from_section {
            target -= 1;
        }
    }

    sections.insert(target, LayoutSection::with_items(vec![item]));
    Ok(Layout { sections })
}

/// Move an item into an existing section at `to_item`.
///
/// `to_section` uses input-layout coordinates; `to_item` is the insertion
/// index within the destination section once the item has been taken out.
/// An emptied source section is pruned.
///
/// # Errors
///
/// [`LayoutError`] if the source item or the destination section does not
/// exist, or `to_item` is past the end of the destination section.
pub fn move_item(
    layout: &Layout,
    from_section: usize,
    from_item: usize,
    to_section: usize,
    to_item: usize,
) -> Result<Layout, LayoutError> {
    check_item(layout, from_section, from_item)?;
    check_section(layout, to_section)?;

    let mut sections = layout.sections.clone();
    let item = sections[from_section].items.remove(from_item);

    let target_len = sections[to_section].items.len();
    if to_item > target_len {
        return Err(LayoutError::ItemOutOfRange {
            section: to_section,
            index: to_item,
            len: target_len,
        });
    }
    sections[to_section].items.insert(to_item, item);

    // The destination just received an item, so it can only be the source
    // when the source is non-empty.
    if sections[from_section].items.is_empty() {
        sections.remove(from_section);
    }

    Ok(Layout { sections })
}

/// Move a whole section so that it ends up at index `to`.
///
/// # Arguments
///
/// * `from` - index of the section to move.
/// * `to` - index the section has after the move. Both indices address the
///   input layout, so `to` must also name an existing section.
///
/// # Errors
///
/// [`LayoutError::SectionOutOfRange`] if either index is out of range.
pub fn move_section(layout: &Layout, from: usize, to: usize) -> Result<Layout, LayoutError> {
    check_section(layout, from)?;
    check_section(layout, to)?;

    let mut sections = layout.sections.clone();
    let section = sections.remove(from);
    sections.insert(to, section);
    Ok(Layout { sections })
}

/// Insert `section` so that it ends up at `index`.
///
/// # Errors
///
/// [`LayoutError::SectionOutOfRange`] if `index` is past the end of the
/// layout. Appending at `index == len` is allowed.
pub fn add_section(
    layout: &Layout,
    index: usize,
    section: LayoutSection,
) -> Result<Layout, LayoutError> {
    check_section_insertion(layout, index)?;

    let mut sections = layout.sections.clone();
    sections.insert(index, section);
    Ok(Layout { sections })
}

/// Remove a section, returning the new layout and the removed section.
///
/// # Errors
///
/// [`LayoutError::SectionOutOfRange`] if `index` is out of range.
pub fn remove_section(
    layout: &Layout,
    index: usize,
) -> Result<(Layout, LayoutSection), LayoutError> {
    check_section(layout, index)?;

    let mut sections = layout.sections.clone();
    let removed = sections.remove(index);
    Ok((Layout { sections }, removed))
}

/// Remove a single slot, pruning its section if it becomes empty.
///
/// # Errors
///
/// [`LayoutError`] if the slot does not exist.
pub fn remove_item(
    layout: &Layout,
    section: usize,
    item: usize,
) -> Result<(Layout, LayoutItem), LayoutError> {
    check_item(layout, section, item)?;

    let mut sections = layout.sections.clone();
    let removed = sections[section].items.remove(item);
    if sections[section].items.is_empty() {
        sections.remove(section);
    }
    Ok((Layout { sections }, removed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(layout: &Layout) -> Vec<Vec<String>> {
        layout.to_widget_ids()
    }

    fn expect(sections: &[&[&str]]) -> Vec<Vec<String>> {
        sections
            .iter()
            .map(|s| s.iter().map(|w| w.to_string()).collect())
            .collect()
    }

    #[test]
    fn moving_sole_item_removes_its_section() {
        let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]);
        let moved = move_item_to_new_section(&layout, 0, 0, 2).unwrap();

        // Section 0 is gone; the new section lands at 2 - 1.
        assert_eq!(ids(&moved), expect(&[&["w2", "w3"], &["w1"]]));
        assert_eq!(moved.sections.len(), layout.sections.len());
    }

    #[test]
    fn sole_item_to_following_index_is_a_structural_no_op() {
        let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]);
        let moved = move_item_to_new_section(&layout, 0, 0, 1).unwrap();
        assert_eq!(ids(&moved), expect(&[&["w1"], &["w2", "w3"]]));
    }

    #[test]
    fn target_before_deleted_section_is_not_shifted() {
        let layout = Layout::from_widgets(vec![vec!["w1", "w2"], vec!["w3"], vec!["w4"]]);
        let moved = move_item_to_new_section(&layout, 1, 0, 0).unwrap();
        assert_eq!(ids(&moved), expect(&[&["w3"], &["w1", "w2"], &["w4"]]));
    }

    #[test]
    fn target_at_deleted_section_keeps_its_position() {
        let layout = Layout::from_widgets(vec![vec!["w1", "w2"], vec!["w3"], vec!["w4"]]);
        let moved = move_item_to_new_section(&layout, 1, 0, 1).unwrap();
        assert_eq!(ids(&moved), expect(&[&["w1", "w2"], &["w3"], &["w4"]]));
    }

    #[test]
    fn splitting_a_section_adds_one() {
        let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]);
        let moved = move_item_to_new_section(&layout, 1, 0, 2).unwrap();
        assert_eq!(ids(&moved), expect(&[&["w1"], &["w3"], &["w2"]]));
        assert_eq!(moved.sections.len(), 3);
    }

    #[test]
    fn move_to_new_section_leaves_input_untouched() {
        let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2"]]);
        let before = layout.clone();
        let _ = move_item_to_new_section(&layout, 0, 0, 2).unwrap();
        assert_eq!(layout, before);
    }

    #[test]
    fn move_to_new_section_rejects_bad_indices() {
        let layout = Layout::from_widgets(vec![vec!["w1"]]);
        assert_eq!(
            move_item_to_new_section(&layout, 1, 0, 0),
            Err(LayoutError::SectionOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            move_item_to_new_section(&layout, 0, 3, 0),
            Err(LayoutError::ItemOutOfRange {
                section: 0,
                index: 3,
                len: 1
            })
        );
        assert_eq!(
            move_item_to_new_section(&layout, 0, 0, 2),
            Err(LayoutError::SectionOutOfRange { index: 2, len: 1 })
        );
    }

    #[test]
    fn move_item_merges_into_existing_section() {
        let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2", "w3"]]);
        let moved = move_item(&layout, 0, 0, 1, 1).unwrap();
        assert_eq!(ids(&moved), expect(&[&["w2", "w1", "w3"]]));
    }

    #[test]
    fn move_item_within_section_reorders() {
        let layout = Layout::from_widgets(vec![vec!["w1", "w2", "w3"]]);
        let moved = move_item(&layout, 0, 0, 0, 2).unwrap();
        assert_eq!(ids(&moved), expect(&[&["w2", "w3", "w1"]]));
    }

    #[test]
    fn move_item_rejects_insertion_past_end() {
        let layout = Layout::from_widgets(vec![vec!["w1"], vec!["w2"]]);
        assert_eq!(
            move_item(&layout, 0, 0, 1, 5),
            Err(LayoutError::ItemOutOfRange {
                section: 1,
                index: 5,
                len: 1
            })
        );
    }

    #[test]
    fn move_section_reorders_sections() {
        let layout = Layout::from_widgets(vec![vec!["a"], vec!["b"], vec!["c"]]);
        let moved = move_section(&layout, 0, 2).unwrap();
        assert_eq!(ids(&moved), expect(&[&["b"], &["c"], &["a"]]));
    }

    #[test]
    fn add_and_remove_section() {
        let layout = Layout::from_widgets(vec![vec!["a"]]);
        let section = LayoutSection::with_items(vec![LayoutItem::placeholder()]);
        let added = add_section(&layout, 0, section).unwrap();
        assert_eq!(ids(&added), expect(&[&["_"], &["a"]]));

        let (removed, section) = remove_section(&added, 1).unwrap();
        assert_eq!(ids(&removed), expect(&[&["_"]]));
        assert_eq!(section.items[0].widget, Some(ObjRef::new("a")));
    }

    #[test]
    fn remove_item_prunes_emptied_section() {
        let layout = Layout::from_widgets(vec![vec!["a"], vec!["b", "c"]]);
        let (after, item) = remove_item(&layout, 0, 0).unwrap();
        assert_eq!(item.widget, Some(ObjRef::new("a")));
        assert_eq!(ids(&after), expect(&[&["b", "c"]]));
    }

    #[test]
    fn position_of_finds_widget() {
        let layout = Layout::from_widgets(vec![vec!["a"], vec!["b", "c"]]);
        assert_eq!(layout.position_of(&ObjRef::new("c")), Some((1, 1)));
        assert_eq!(layout.position_of(&ObjRef::new("z")), None);
    }
}
