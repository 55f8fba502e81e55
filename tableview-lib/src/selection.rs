//! Row selection.
//!
//! The selected keys live independently of sorting, filtering and paging.
//! For tree data (unless `check_strictly`), a parent is selected exactly
//! when all of its enabled children are; the stored key set is kept in that
//! normalized form after every change, so checked and indeterminate states
//! can be read straight from it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use crate::column::Fixed;
use crate::diagnostic::Diagnostic;
use crate::diagnostic::Diagnostics;
use crate::key::RowKey;
use crate::key::RowKeyResolver;
use crate::model::Record;

/// Selection widget kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    /// Any number of rows.
    #[default]
    Checkbox,
    /// At most one row.
    Radio,
}

/// Effective selection behaviour, derived from configuration and data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMode {
    /// Selection is not configured.
    #[default]
    None,
    /// Radio selection.
    Single,
    /// Flat checkbox selection.
    Multiple,
    /// Checkbox selection cascading through tree data.
    CheckboxTree,
}

/// Rows a bulk action applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// Rows on the visible page, children included.
    CurrentPage,
    /// Every sorted and filtered row, unpaginated, children included.
    AllData,
}

/// Built-in bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionAction {
    /// Select every enabled row in scope.
    SelectAll,
    /// Flip every enabled row in scope.
    SelectInvert,
    /// Deselect every enabled row in scope.
    SelectNone,
}

/// Bulk actions offered in the selection column's header menu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selections {
    /// `true` offers every built-in action, `false` none.
    Builtins(bool),
    /// An explicit list.
    List(Vec<SelectionAction>),
}

impl Selections {
    /// The offered actions.
    pub fn actions(&self) -> Vec<SelectionAction> {
        match self {
            Selections::Builtins(true) => vec![
                SelectionAction::SelectAll,
                SelectionAction::SelectInvert,
                SelectionAction::SelectNone,
            ],
            Selections::Builtins(false) => Vec::new(),
            Selections::List(actions) => actions.clone(),
        }
    }
}

impl Default for Selections {
    fn default() -> Self {
        Selections::Builtins(false)
    }
}

/// Checked state of a row or of the header checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckState {
    Unchecked,
    Checked,
    /// Some, but not all, descendants are selected.
    Indeterminate,
}

/// Per-row checkbox options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckboxProps {
    /// The row cannot be selected or deselected.
    pub disabled: bool,
}

/// Per-row checkbox options callback.
pub type CheckboxPropsFn = Arc<dyn Fn(&Record) -> CheckboxProps + Send + Sync>;

/// Row selection options.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionConfig {
    #[serde(rename = "type")]
    pub kind: SelectionType,
    /// Controlled selection. When set, it replaces the selection whenever the
    /// configuration is applied.
    pub selected_row_keys: Option<Vec<RowKey>>,
    /// Disables cascading through tree data.
    pub check_strictly: bool,
    /// Keep keys whose rows are no longer in the data.
    pub preserve_selected_row_keys: bool,
    pub hide_select_all: bool,
    pub selections: Selections,
    pub fixed: Option<Fixed>,
    pub column_width: Option<u32>,
    pub column_title: Option<String>,
    #[serde(skip)]
    pub get_checkbox_props: Option<CheckboxPropsFn>,
}

impl SelectionConfig {
    /// Checkbox selection.
    pub fn checkbox() -> Self {
        Self::default()
    }

    /// Radio selection.
    pub fn radio() -> Self {
        Self {
            kind: SelectionType::Radio,
            ..Self::default()
        }
    }

    /// Sets the controlled selection.
    pub fn with_selected_row_keys(mut self, keys: Vec<RowKey>) -> Self {
        self.selected_row_keys = Some(keys);
        self
    }

    /// Turns tree cascading off or on.
    pub fn with_check_strictly(mut self, check_strictly: bool) -> Self {
        self.check_strictly = check_strictly;
        self
    }

    /// Keeps keys of rows that left the data.
    pub fn preserving_keys(mut self) -> Self {
        self.preserve_selected_row_keys = true;
        self
    }

    /// Sets the header bulk actions.
    pub fn with_selections(mut self, selections: Selections) -> Self {
        self.selections = selections;
        self
    }

    /// Sets the per-row checkbox options callback.
    pub fn with_checkbox_props(
        mut self,
        f: impl Fn(&Record) -> CheckboxProps + Send + Sync + 'static,
    ) -> Self {
        self.get_checkbox_props = Some(Arc::new(f));
        self
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            kind: SelectionType::Checkbox,
            selected_row_keys: None,
            check_strictly: false,
            preserve_selected_row_keys: false,
            hide_select_all: false,
            selections: Selections::default(),
            fixed: None,
            column_width: None,
            column_title: None,
            get_checkbox_props: None,
        }
    }
}

impl fmt::Debug for SelectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionConfig")
            .field("kind", &self.kind)
            .field("selected_row_keys", &self.selected_row_keys)
            .field("check_strictly", &self.check_strictly)
            .field("preserve_selected_row_keys", &self.preserve_selected_row_keys)
            .field("hide_select_all", &self.hide_select_all)
            .field("selections", &self.selections)
            .field("fixed", &self.fixed)
            .field("column_width", &self.column_width)
            .field("column_title", &self.column_title)
            .field("get_checkbox_props", &self.get_checkbox_props.is_some())
            .finish()
    }
}

/// What kind of interaction produced a selection change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionChangeKind {
    Single,
    Multiple,
    All,
    Invert,
    None,
}

/// Selection change notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionChange {
    /// Selected keys after the change.
    pub keys: Vec<RowKey>,
    /// Records of the selected keys that are present in the data.
    pub records: Vec<Record>,
    /// Interaction that caused the change.
    pub kind: SelectionChangeKind,
}

/// Owns the selected key set.
#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    config: Option<SelectionConfig>,
    keys: BTreeSet<RowKey>,
    anchor: Option<RowKey>,
}

impl SelectionCoordinator {
    /// Creates a coordinator; `None` means selection is not configured.
    pub fn new(config: Option<SelectionConfig>) -> Self {
        let mut coordinator = Self::default();
        coordinator.set_config(config);
        coordinator
    }

    /// Replaces the configuration. A controlled key list replaces the
    /// selection.
    pub fn set_config(&mut self, config: Option<SelectionConfig>) {
        if let Some(keys) = config.as_ref().and_then(|c| c.selected_row_keys.as_ref()) {
            self.keys = keys.iter().cloned().collect();
        }
        if config.is_none() {
            self.keys.clear();
            self.anchor = None;
        }
        self.config = config;
    }

    /// The configuration.
    pub fn config(&self) -> Option<&SelectionConfig> {
        self.config.as_ref()
    }

    /// Returns `true` if selection is configured.
    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Effective mode for the resolver's data.
    pub fn mode(&self, resolver: &RowKeyResolver) -> SelectionMode {
        let Some(config) = &self.config else {
            return SelectionMode::None;
        };
        match config.kind {
            SelectionType::Radio => SelectionMode::Single,
            SelectionType::Checkbox => {
                let field = resolver.children_field();
                let is_tree = resolver
                    .data()
                    .iter()
                    .any(|record| record.children(field).is_some_and(|c| !c.is_empty()));
                if is_tree && !config.check_strictly {
                    SelectionMode::CheckboxTree
                } else {
                    SelectionMode::Multiple
                }
            }
        }
    }

    /// The selected keys.
    pub fn keys(&self) -> &BTreeSet<RowKey> {
        &self.keys
    }

    /// Returns `true` if `key` is selected.
    pub fn is_selected(&self, key: &RowKey) -> bool {
        self.keys.contains(key)
    }

    /// Returns `true` if the row's checkbox is disabled.
    pub fn is_disabled(&self, record: &Record) -> bool {
        self.config
            .as_ref()
            .and_then(|config| config.get_checkbox_props.as_ref())
            .is_some_and(|props| props(record).disabled)
    }

    /// Enabled keys of `records` and their descendants, depth first.
    pub fn changeable_keys(&self, records: &[Record], resolver: &RowKeyResolver) -> Vec<RowKey> {
        resolver
            .flatten(records)
            .into_iter()
            .filter(|(_, record)| !self.is_disabled(record))
            .map(|(key, _)| key)
            .collect()
    }

    /// Checked state of one row.
    pub fn check_state(&self, key: &RowKey, resolver: &RowKeyResolver) -> CheckState {
        if self.keys.contains(key) {
            return CheckState::Checked;
        }
        if self.mode(resolver) == SelectionMode::CheckboxTree
            && let Some(record) = resolver.get(key)
            && resolver
                .descendant_keys(record)
                .iter()
                .any(|descendant| self.keys.contains(descendant))
        {
            return CheckState::Indeterminate;
        }
        CheckState::Unchecked
    }

    /// Header checkbox state over the enabled rows of `page`.
    pub fn header_state(&self, page: &[Record], resolver: &RowKeyResolver) -> CheckState {
        let keys = self.changeable_keys(page, resolver);
        let selected = keys.iter().filter(|key| self.keys.contains(key)).count();
        if selected == 0 {
            CheckState::Unchecked
        } else if selected == keys.len() {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }

    /// Selects one row; in tree mode its enabled descendants too.
    pub fn select(
        &mut self,
        key: &RowKey,
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        let record = self.changeable_record(key, resolver, diagnostics)?;
        match self.mode(resolver) {
            SelectionMode::None => return None,
            SelectionMode::Single => {
                self.keys.clear();
                self.keys.insert(key.clone());
            }
            SelectionMode::Multiple => {
                self.keys.insert(key.clone());
            }
            SelectionMode::CheckboxTree => {
                self.keys.insert(key.clone());
                let descendants = record
                    .children(resolver.children_field())
                    .map(|children| self.changeable_keys(children, resolver))
                    .unwrap_or_default();
                self.keys.extend(descendants);
            }
        }
        self.anchor = Some(key.clone());
        Some(self.finish(resolver, SelectionChangeKind::Single))
    }

    /// Deselects one row; in tree mode its descendants and ancestors too.
    pub fn deselect(
        &mut self,
        key: &RowKey,
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        let record = self.changeable_record(key, resolver, diagnostics)?;
        self.keys.remove(key);
        if self.mode(resolver) == SelectionMode::CheckboxTree {
            self.remove_enabled(resolver.descendant_keys(record), resolver);
            self.remove_enabled(resolver.ancestors(key), resolver);
        }
        self.anchor = Some(key.clone());
        Some(self.finish(resolver, SelectionChangeKind::Single))
    }

    /// Flips one row.
    pub fn toggle(
        &mut self,
        key: &RowKey,
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        if self.keys.contains(key) {
            self.deselect(key, resolver, diagnostics)
        } else {
            self.select(key, resolver, diagnostics)
        }
    }

    /// Range selection from the last toggled row through `key` over the
    /// flattened page; every enabled row in between takes the new state of
    /// `key`. Without an anchor on the page this is a plain toggle.
    pub fn select_range(
        &mut self,
        key: &RowKey,
        page: &[Record],
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        if !matches!(
            self.mode(resolver),
            SelectionMode::Multiple | SelectionMode::CheckboxTree
        ) {
            return self.toggle(key, resolver, diagnostics);
        }
        let flattened = resolver.flatten(page);
        let position_of = |wanted: &RowKey| flattened.iter().position(|(k, _)| k == wanted);
        let (Some(anchor), Some(target)) = (
            self.anchor.as_ref().and_then(|anchor| position_of(anchor)),
            position_of(key),
        ) else {
            return self.toggle(key, resolver, diagnostics);
        };
        self.changeable_record(key, resolver, diagnostics)?;

        let select = !self.keys.contains(key);
        let (from, to) = (anchor.min(target), anchor.max(target));
        for (range_key, record) in &flattened[from..=to] {
            if self.is_disabled(record) {
                continue;
            }
            if select {
                self.keys.insert(range_key.clone());
            } else {
                self.keys.remove(range_key);
            }
        }
        if !select && self.mode(resolver) == SelectionMode::CheckboxTree {
            self.remove_enabled(resolver.ancestors(key), resolver);
        }
        self.anchor = Some(key.clone());
        Some(self.finish(resolver, SelectionChangeKind::Multiple))
    }

    /// Header checkbox interaction: selects every enabled page row, or
    /// deselects them all when they already were.
    pub fn toggle_all(
        &mut self,
        page: &[Record],
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        if !self.require_enabled(diagnostics) {
            return None;
        }
        let keys = self.changeable_keys(page, resolver);
        let all_selected = keys.iter().all(|key| self.keys.contains(key));
        for key in keys {
            if all_selected {
                self.keys.remove(&key);
            } else {
                self.keys.insert(key);
            }
        }
        Some(self.finish(resolver, SelectionChangeKind::All))
    }

    /// Applies a built-in bulk action to the enabled rows of `scope`.
    pub fn apply(
        &mut self,
        action: SelectionAction,
        scope: &[Record],
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        if !self.require_enabled(diagnostics) {
            return None;
        }
        if self.mode(resolver) == SelectionMode::Single && action != SelectionAction::SelectNone {
            log::debug!("{:?} ignored for radio selection", action);
            return None;
        }
        let keys = self.changeable_keys(scope, resolver);
        let kind = match action {
            SelectionAction::SelectAll => {
                self.keys.extend(keys);
                SelectionChangeKind::All
            }
            SelectionAction::SelectInvert => {
                for key in keys {
                    if !self.keys.remove(&key) {
                        self.keys.insert(key);
                    }
                }
                SelectionChangeKind::Invert
            }
            SelectionAction::SelectNone => {
                for key in &keys {
                    self.keys.remove(key);
                }
                SelectionChangeKind::None
            }
        };
        log::debug!("selection action {:?} applied", action);
        Some(self.finish(resolver, kind))
    }

    /// Deselects everything.
    pub fn clear(
        &mut self,
        resolver: &RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<SelectionChange> {
        if !self.require_enabled(diagnostics) {
            return None;
        }
        self.keys.clear();
        self.anchor = None;
        Some(self.finish(resolver, SelectionChangeKind::None))
    }

    /// Replaces the selection without notifying.
    pub fn set_keys(&mut self, keys: impl IntoIterator<Item = RowKey>, resolver: &RowKeyResolver) {
        self.keys = keys.into_iter().collect();
        if self.mode(resolver) == SelectionMode::CheckboxTree {
            self.normalize(resolver);
        }
    }

    /// Records of the selected keys present in the data, in key order.
    pub fn selected_records(&self, resolver: &RowKeyResolver) -> Vec<Record> {
        self.keys
            .iter()
            .filter_map(|key| resolver.get(key))
            .cloned()
            .collect()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_enabled(&self, diagnostics: &mut Diagnostics) -> bool {
        if self.config.is_none() {
            diagnostics.report(Diagnostic::SelectionDisabled);
            return false;
        }
        true
    }

    fn changeable_record<'r>(
        &self,
        key: &RowKey,
        resolver: &'r RowKeyResolver,
        diagnostics: &mut Diagnostics,
    ) -> Option<&'r Record> {
        if !self.require_enabled(diagnostics) {
            return None;
        }
        let Some(record) = resolver.get(key) else {
            diagnostics.report(Diagnostic::UnknownRowKey { key: key.clone() });
            return None;
        };
        if self.is_disabled(record) {
            diagnostics.report(Diagnostic::DisabledRow { key: key.clone() });
            return None;
        }
        Some(record)
    }

    /// Deselects `keys`, leaving disabled rows as they are.
    fn remove_enabled(&mut self, keys: Vec<RowKey>, resolver: &RowKeyResolver) {
        for key in keys {
            if resolver.get(&key).is_some_and(|record| !self.is_disabled(record)) {
                self.keys.remove(&key);
            }
        }
    }

    fn finish(&mut self, resolver: &RowKeyResolver, kind: SelectionChangeKind) -> SelectionChange {
        if self.mode(resolver) == SelectionMode::CheckboxTree {
            self.normalize(resolver);
        }
        let preserve = self
            .config
            .as_ref()
            .is_some_and(|config| config.preserve_selected_row_keys);
        if !preserve {
            self.keys.retain(|key| resolver.contains(key));
        }
        SelectionChange {
            keys: self.keys.iter().cloned().collect(),
            records: self.selected_records(resolver),
            kind,
        }
    }

    /// Re-derives every enabled parent from its enabled children, bottom-up.
    /// Disabled parents and parents without enabled children keep their own
    /// state.
    fn normalize(&mut self, resolver: &RowKeyResolver) {
        self.normalize_level(resolver.data(), resolver);
    }

    fn normalize_level(&mut self, records: &[Record], resolver: &RowKeyResolver) {
        let field = resolver.children_field();
        for (position, record) in records.iter().enumerate() {
            let Some(children) = record.children(field) else {
                continue;
            };
            self.normalize_level(children, resolver);
            if self.is_disabled(record) {
                continue;
            }

            let enabled: Vec<RowKey> = children
                .iter()
                .enumerate()
                .filter(|(_, child)| !self.is_disabled(child))
                .map(|(index, child)| resolver.row_key(child, index))
                .collect();
            if enabled.is_empty() {
                continue;
            }
            let key = resolver.row_key(record, position);
            if enabled.iter().all(|child| self.keys.contains(child)) {
                self.keys.insert(key);
            } else {
                self.keys.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RowKeyStrategy;

    fn tree() -> RowKeyResolver {
        let data = vec![
            Record::new().set("key", 1).with_children(
                "children",
                vec![
                    Record::new().set("key", 11),
                    Record::new().set("key", 12).with_children(
                        "children",
                        vec![Record::new().set("key", 121), Record::new().set("key", 122)],
                    ),
                ],
            ),
            Record::new().set("key", 2),
        ];
        RowKeyResolver::new(Arc::new(data), RowKeyStrategy::default(), "children")
    }

    fn keys(coordinator: &SelectionCoordinator) -> Vec<i64> {
        coordinator
            .keys()
            .iter()
            .filter_map(|key| match key {
                RowKey::Number(n) => Some(*n),
                RowKey::Text(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_mode_from_config_and_data() {
        let resolver = tree();
        assert_eq!(SelectionCoordinator::new(None).mode(&resolver), SelectionMode::None);
        assert_eq!(
            SelectionCoordinator::new(Some(SelectionConfig::radio())).mode(&resolver),
            SelectionMode::Single
        );
        assert_eq!(
            SelectionCoordinator::new(Some(SelectionConfig::checkbox())).mode(&resolver),
            SelectionMode::CheckboxTree
        );
        assert_eq!(
            SelectionCoordinator::new(Some(SelectionConfig::checkbox().with_check_strictly(true)))
                .mode(&resolver),
            SelectionMode::Multiple
        );
    }

    #[test]
    fn test_select_parent_cascades() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));

        let change = selection.select(&RowKey::from(1), &resolver, &mut diagnostics).unwrap();
        assert_eq!(keys(&selection), vec![1, 11, 12, 121, 122]);
        assert_eq!(change.records.len(), 5);
    }

    #[test]
    fn test_deselect_descendant_makes_ancestors_indeterminate() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));
        selection.select(&RowKey::from(1), &resolver, &mut diagnostics);
        selection.deselect(&RowKey::from(121), &resolver, &mut diagnostics);

        assert_eq!(keys(&selection), vec![11, 122]);
        assert_eq!(selection.check_state(&RowKey::from(1), &resolver), CheckState::Indeterminate);
        assert_eq!(selection.check_state(&RowKey::from(12), &resolver), CheckState::Indeterminate);
        assert_eq!(selection.check_state(&RowKey::from(11), &resolver), CheckState::Checked);
    }

    #[test]
    fn test_selecting_all_children_checks_parent() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));
        selection.select(&RowKey::from(121), &resolver, &mut diagnostics);
        selection.select(&RowKey::from(122), &resolver, &mut diagnostics);

        assert!(selection.is_selected(&RowKey::from(12)));
        assert_eq!(selection.check_state(&RowKey::from(1), &resolver), CheckState::Indeterminate);
    }

    #[test]
    fn test_invert_twice_restores() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));
        selection.select(&RowKey::from(121), &resolver, &mut diagnostics);
        let before = selection.keys().clone();

        let data = resolver.data_arc();
        selection.apply(SelectionAction::SelectInvert, &data, &resolver, &mut diagnostics);
        assert_ne!(selection.keys(), &before);
        selection.apply(SelectionAction::SelectInvert, &data, &resolver, &mut diagnostics);
        assert_eq!(selection.keys(), &before);
    }

    #[test]
    fn test_disabled_rows_are_skipped() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let config = SelectionConfig::checkbox().with_checkbox_props(|record| CheckboxProps {
            disabled: record.get_long("key").ok().flatten() == Some(2),
        });
        let mut selection = SelectionCoordinator::new(Some(config));

        assert!(selection.toggle(&RowKey::from(2), &resolver, &mut diagnostics).is_none());
        assert!(diagnostics.contains(&Diagnostic::DisabledRow { key: RowKey::from(2) }));

        let data = resolver.data_arc();
        selection.apply(SelectionAction::SelectAll, &data, &resolver, &mut diagnostics);
        assert!(!selection.is_selected(&RowKey::from(2)));
        assert!(selection.is_selected(&RowKey::from(1)));
    }

    #[test]
    fn test_deselect_cascade_keeps_disabled_child() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let config = SelectionConfig::checkbox().with_checkbox_props(|record| CheckboxProps {
            disabled: record.get_long("key").ok().flatten() == Some(11),
        });
        let mut selection = SelectionCoordinator::new(Some(config));
        selection.set_keys([1i64, 11, 12, 121, 122].map(RowKey::from), &resolver);

        selection.deselect(&RowKey::from(1), &resolver, &mut diagnostics);

        assert_eq!(keys(&selection), vec![11]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_children_are_not_tree_data() {
        let data: Vec<Record> =
            serde_json::from_str(r#"[{"key": 1, "children": []}, {"key": 2}]"#).unwrap();
        let resolver = RowKeyResolver::new(Arc::new(data), RowKeyStrategy::default(), "children");
        let selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));

        assert_eq!(selection.mode(&resolver), SelectionMode::Multiple);
    }

    #[test]
    fn test_radio_keeps_one_key() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::radio()));
        selection.select(&RowKey::from(11), &resolver, &mut diagnostics);
        selection.select(&RowKey::from(2), &resolver, &mut diagnostics);

        assert_eq!(keys(&selection), vec![2]);
    }

    #[test]
    fn test_unknown_keys_pruned_unless_preserved() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut pruning = SelectionCoordinator::new(Some(
            SelectionConfig::checkbox().with_selected_row_keys(vec![RowKey::from(99)]),
        ));
        pruning.select(&RowKey::from(2), &resolver, &mut diagnostics);
        assert_eq!(keys(&pruning), vec![2]);

        let mut preserving = SelectionCoordinator::new(Some(
            SelectionConfig::checkbox()
                .with_selected_row_keys(vec![RowKey::from(99)])
                .preserving_keys(),
        ));
        preserving.select(&RowKey::from(2), &resolver, &mut diagnostics);
        assert_eq!(keys(&preserving), vec![2, 99]);
    }

    #[test]
    fn test_header_toggle_all() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));
        let data = resolver.data_arc();

        assert_eq!(selection.header_state(&data, &resolver), CheckState::Unchecked);
        selection.toggle_all(&data, &resolver, &mut diagnostics);
        assert_eq!(selection.header_state(&data, &resolver), CheckState::Checked);
        selection.toggle_all(&data, &resolver, &mut diagnostics);
        assert!(selection.keys().is_empty());
    }

    #[test]
    fn test_select_range_over_flat_rows() {
        let data: Vec<Record> = (1..=5).map(|n| Record::new().set("key", n)).collect();
        let resolver = RowKeyResolver::new(Arc::new(data), RowKeyStrategy::default(), "children");
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(Some(SelectionConfig::checkbox()));
        let page = resolver.data_arc();

        selection.toggle(&RowKey::from(2), &resolver, &mut diagnostics);
        let change = selection
            .select_range(&RowKey::from(4), &page, &resolver, &mut diagnostics)
            .unwrap();

        assert_eq!(change.kind, SelectionChangeKind::Multiple);
        assert_eq!(keys(&selection), vec![2, 3, 4]);
    }

    #[test]
    fn test_events_without_config_report() {
        let resolver = tree();
        let mut diagnostics = Diagnostics::new();
        let mut selection = SelectionCoordinator::new(None);

        assert!(selection.select(&RowKey::from(1), &resolver, &mut diagnostics).is_none());
        assert!(diagnostics.contains(&Diagnostic::SelectionDisabled));
    }
}
