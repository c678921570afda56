//! Layout handlers. Layout changes are only allowed in edit mode.
//!
//! Each handler computes the new layout with the pure resolver functions and
//! commits it with `ReplaceLayout`. Widgets leaving the layout are removed
//! after their slot, so no slot ever points at a missing widget.

use std::collections::BTreeSet;

use super::HandlerResult;
use crate::error::CommandError;
use crate::event::EventPayload;
use crate::layout::{self, LayoutItem, LayoutSection, SectionHeader};
use crate::state::{DashboardState, Mutation};
use crate::widget::Widget;

fn require_edit_mode(state: &DashboardState) -> Result<(), CommandError> {
    if state.is_edit_mode() {
        Ok(())
    } else {
        Err(CommandError::InvalidTransition {
            reason: "layout can only be changed in edit mode".into(),
        })
    }
}

pub(super) fn add_section(
    state: &DashboardState,
    index: usize,
    header: Option<SectionHeader>,
    items: Vec<LayoutItem>,
    widgets: Vec<Widget>,
) -> HandlerResult {
    require_edit_mode(state)?;

    for widget in &widgets {
        if state.widgets.contains_key(widget.widget_ref()) {
            return Err(CommandError::ValidationFailed {
                reason: format!("widget {} already exists", widget.widget_ref()),
            });
        }
    }

    let mut placed = BTreeSet::new();
    for widget_ref in items.iter().filter_map(|item| item.widget.as_ref()) {
        let known = state.widgets.contains_key(widget_ref)
            || widgets.iter().any(|w| w.widget_ref() == widget_ref);
        if !known {
            return Err(CommandError::widget_not_found(widget_ref));
        }
        if state.layout_position_of(widget_ref).is_some() || !placed.insert(widget_ref) {
            return Err(CommandError::ValidationFailed {
                reason: format!("widget {widget_ref} is already placed in the layout"),
            });
        }
    }

    let section = LayoutSection { header, items };
    let new_layout = layout::add_section(&state.layout, index, section.clone())?;

    let mut mutations: Vec<Mutation> = widgets.into_iter().map(Mutation::AddWidget).collect();
    mutations.push(Mutation::ReplaceLayout(new_layout));
    Ok((mutations, EventPayload::LayoutSectionAdded { index, section }))
}

pub(super) fn remove_section(state: &DashboardState, index: usize) -> HandlerResult {
    require_edit_mode(state)?;

    let (new_layout, section) = layout::remove_section(&state.layout, index)?;
    let mut mutations = vec![Mutation::ReplaceLayout(new_layout)];
    mutations.extend(removed_widgets(&section.items));
    Ok((mutations, EventPayload::LayoutSectionRemoved { index, section }))
}

pub(super) fn move_section(state: &DashboardState, from: usize, to: usize) -> HandlerResult {
    require_edit_mode(state)?;

    let new_layout = layout::move_section(&state.layout, from, to)?;
    Ok((
        vec![Mutation::ReplaceLayout(new_layout)],
        EventPayload::LayoutSectionMoved { from, to },
    ))
}

pub(super) fn move_item(
    state: &DashboardState,
    from_section: usize,
    from_item: usize,
    to_section: usize,
    to_item: usize,
) -> HandlerResult {
    require_edit_mode(state)?;

    let new_layout =
        layout::move_item(&state.layout, from_section, from_item, to_section, to_item)?;
    let (item, source_section_removed) = moved_item(state, from_section, from_item);
    Ok((
        vec![Mutation::ReplaceLayout(new_layout)],
        EventPayload::LayoutSectionItemMoved {
            item,
            from_section,
            from_item,
            to_section: final_section(source_section_removed, from_section, to_section),
            to_item,
            source_section_removed,
        },
    ))
}

pub(super) fn move_item_to_new_section(
    state: &DashboardState,
    from_section: usize,
    from_item: usize,
    to_section: usize,
) -> HandlerResult {
    require_edit_mode(state)?;

    let new_layout =
        layout::move_item_to_new_section(&state.layout, from_section, from_item, to_section)?;
    let (item, source_section_removed) = moved_item(state, from_section, from_item);
    Ok((
        vec![Mutation::ReplaceLayout(new_layout)],
        EventPayload::LayoutSectionItemMovedToNewSection {
            item,
            from_section,
            from_item,
            to_section: final_section(source_section_removed, from_section, to_section),
            source_section_removed,
        },
    ))
}

pub(super) fn remove_item(state: &DashboardState, section: usize, item: usize) -> HandlerResult {
    require_edit_mode(state)?;

    let (new_layout, removed) = layout::remove_item(&state.layout, section, item)?;
    let section_removed = new_layout.sections.len() < state.layout.sections.len();

    let mut mutations = vec![Mutation::ReplaceLayout(new_layout)];
    mutations.extend(removed_widgets(std::slice::from_ref(&removed)));
    Ok((
        mutations,
        EventPayload::LayoutSectionItemRemoved {
            section,
            item: removed,
            section_removed,
        },
    ))
}

/// The item at the source coordinates and whether taking it out empties its
/// section. The resolver has already checked the coordinates.
fn moved_item(state: &DashboardState, from_section: usize, from_item: usize) -> (LayoutItem, bool) {
    let source = &state.layout.sections[from_section];
    (source.items[from_item].clone(), source.items.len() == 1)
}

/// Index of the destination section once an emptied source is pruned.
fn final_section(source_section_removed: bool, from_section: usize, to_section: usize) -> usize {
    if source_section_removed && to_section > from_section {
        to_section - 1
    } else {
        to_section
    }
}

fn removed_widgets(items: &[LayoutItem]) -> impl Iterator<Item = Mutation> + '_ {
    items
        .iter()
        .filter_map(|item| item.widget.clone())
        .map(Mutation::RemoveWidget)
}
