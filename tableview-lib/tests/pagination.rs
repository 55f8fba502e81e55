//! Pagination through the table view.

use std::cell::RefCell;
use std::rc::Rc;

use tableview_lib::TableView;
use tableview_lib::change::Action;
use tableview_lib::column::ColumnDescriptor;
use tableview_lib::column::ColumnFilter;
use tableview_lib::column::FilterOption;
use tableview_lib::config::TableConfig;
use tableview_lib::diagnostic::Diagnostic;
use tableview_lib::model::Record;
use tableview_lib::pagination::Pagination;
use tableview_lib::pagination::PaginationConfig;

fn rows(count: i32) -> Vec<Record> {
    (1..=count)
        .map(|n| Record::new().set("id", n).set("group", n % 3))
        .collect()
}

fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.get_long("id").ok().flatten())
        .collect()
}

fn config(pagination: PaginationConfig) -> TableConfig {
    TableConfig::default()
        .with_row_key_field("id")
        .with_pagination(pagination)
}

fn columns() -> Vec<ColumnDescriptor> {
    vec![ColumnDescriptor::new("group").filter(ColumnFilter::new(vec![
        FilterOption::new("0", 0),
        FilterOption::new("1", 1),
        FilterOption::new("2", 2),
    ]))]
}

#[test]
fn test_second_page_of_three_rows() {
    let view = TableView::new(
        rows(3),
        columns(),
        config(PaginationConfig::new().with_current(2).with_page_size(2)),
    );

    assert_eq!(ids(view.visible_data()), vec![3]);
    assert!(view.diagnostics().is_empty());
}

#[test]
fn test_total_override_shows_loaded_rows() {
    let view = TableView::new(
        rows(3),
        columns(),
        config(PaginationConfig::new().with_total(100)),
    );

    assert_eq!(ids(view.visible_data()), vec![1, 2, 3]);
    assert!(view.diagnostics().contains(&Diagnostic::PartialDataWithinPage {
        loaded: 3,
        total: 100
    }));
    assert_eq!(view.pagination_state().map(|p| p.total), Some(100));
}

#[test]
fn test_pages_cover_every_row() {
    let mut view = TableView::new(rows(23), columns(), config(PaginationConfig::new()));
    let mut seen = Vec::new();
    for page in 1..=3 {
        view.change_page(page, 10);
        seen.extend(ids(view.visible_data()));
    }

    assert_eq!(seen.len(), view.processed_data().len());
    assert_eq!(seen, (1..=23).collect::<Vec<i64>>());
}

#[test]
fn test_page_change_notifies_both_handlers() {
    let mut view = TableView::new(rows(23), columns(), config(PaginationConfig::new()));
    let pages = Rc::new(RefCell::new(Vec::new()));
    let actions = Rc::new(RefCell::new(Vec::new()));
    let page_sink = Rc::clone(&pages);
    let action_sink = Rc::clone(&actions);
    view.on_pagination_change(move |current, size| page_sink.borrow_mut().push((current, size)));
    view.on_change(move |event| action_sink.borrow_mut().push(event.action));

    view.change_page(2, 10);

    assert_eq!(*pages.borrow(), vec![(2, 10)]);
    assert_eq!(*actions.borrow(), vec![Action::Paginate]);
    assert_eq!(ids(view.visible_data()).first(), Some(&11));
}

#[test]
fn test_page_size_change_restarts_at_first_page() {
    let mut view = TableView::new(rows(23), columns(), config(PaginationConfig::new()));
    let pages = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&pages);
    view.on_pagination_change(move |current, size| sink.borrow_mut().push((current, size)));

    view.change_page(3, 10);
    view.change_page(3, 5);

    assert_eq!(*pages.borrow(), vec![(3, 10), (1, 5)]);
    assert_eq!(ids(view.visible_data()), vec![1, 2, 3, 4, 5]);
    let event = view.last_change().unwrap();
    assert_eq!(event.pagination.as_ref().map(|p| (p.current, p.page_size)), Some((1, 5)));
}

#[test]
fn test_shrinking_data_resets_page() {
    let mut view = TableView::new(rows(23), columns(), config(PaginationConfig::new()));
    view.change_page(3, 10);
    view.set_data(rows(5));

    assert_eq!(view.pagination_state().map(|p| p.current), Some(1));
    assert_eq!(ids(view.visible_data()), vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_disabled_pagination_shows_everything() {
    let mut view = TableView::new(
        rows(23),
        columns(),
        TableConfig::default().with_row_key_field("id").without_pagination(),
    );
    view.change_page(2, 10);

    assert_eq!(view.visible_data().len(), 23);
    assert!(view.pagination_state().is_none());
    assert!(view.last_change().is_none());
    assert_eq!(view.pagination_placements(), (false, false));
}

#[test]
fn test_zero_current_reports_diagnostic() {
    let view = TableView::new(
        rows(5),
        columns(),
        config(PaginationConfig::new().with_current(0).with_page_size(2)),
    );

    assert_eq!(ids(view.visible_data()), vec![1, 2]);
    assert!(view.diagnostics().contains(&Diagnostic::NonPositiveCurrent));
}

#[test]
fn test_controlled_config_replacement() {
    let mut view = TableView::new(
        rows(23),
        columns(),
        config(PaginationConfig::new().with_current(1)),
    );
    view.set_pagination(Pagination::Enabled(PaginationConfig::new().with_current(3)));

    assert_eq!(ids(view.visible_data()), vec![21, 22, 23]);
}

#[test]
fn test_page_past_last_clamps_before_notifying() {
    let mut view = TableView::new(rows(30), columns(), config(PaginationConfig::new()));
    let pages = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&pages);
    view.on_pagination_change(move |current, size| sink.borrow_mut().push((current, size)));

    view.change_page(5, 10);

    let event = view.last_change().unwrap();
    let state = view.pagination_state().unwrap();
    assert_eq!(event.pagination.as_ref().map(|p| p.current), Some(3));
    assert_eq!(state.current, 3);
    assert_eq!(ids(view.visible_data()).first(), Some(&21));
    assert_eq!(*pages.borrow(), vec![(3, 10)]);
}

#[test]
fn test_page_change_to_zero_reports_diagnostic() {
    let mut view = TableView::new(rows(30), columns(), config(PaginationConfig::new()));
    view.change_page(2, 10);
    view.change_page(0, 10);

    assert!(view.diagnostics().contains(&Diagnostic::NonPositiveCurrent));
    assert_eq!(view.pagination_state().map(|p| p.current), Some(1));
    assert_eq!(ids(view.visible_data()).first(), Some(&1));
}
