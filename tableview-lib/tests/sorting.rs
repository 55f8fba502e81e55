//! Sorting through the table view.

use tableview_lib::TableView;
use tableview_lib::change::Action;
use tableview_lib::column::ColumnDescriptor;
use tableview_lib::column::Sorter;
use tableview_lib::config::TableConfig;
use tableview_lib::model::Record;
use tableview_lib::sort::SortEngine;
use tableview_lib::sort::SortOrder;

fn people() -> Vec<Record> {
    vec![
        Record::new().set("id", 1).set("age", 30).set("name", "Cleo"),
        Record::new().set("id", 2).set("age", 20).set("name", "Abe"),
        Record::new().set("id", 3).set("age", 25).set("name", "Bo"),
    ]
}

fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.get_long("id").ok().flatten())
        .collect()
}

fn config() -> TableConfig {
    TableConfig::default().with_row_key_field("id")
}

#[test]
fn test_sort_by_age_ascending() {
    let mut view = TableView::new(
        people(),
        vec![ColumnDescriptor::new("age").sortable()],
        config(),
    );
    view.set_sort("age", Some(SortOrder::Ascend));

    assert_eq!(ids(view.visible_data()), vec![2, 3, 1]);
    let event = view.last_change().unwrap();
    assert_eq!(event.action, Action::Sort);
    assert_eq!(event.sorter[0].order, Some(SortOrder::Ascend));
}

#[test]
fn test_sort_is_idempotent() {
    let mut view = TableView::new(
        people(),
        vec![ColumnDescriptor::new("age").sortable()],
        config(),
    );
    view.set_sort("age", Some(SortOrder::Descend));
    let once = view.processed_data().to_vec();

    let columns = view.column_set().clone();
    let twice = SortEngine::with_states(view.sort_states().to_vec())
        .apply(&once, &columns, "children")
        .into_owned();
    assert_eq!(once, twice);
}

#[test]
fn test_toggle_cycles_back_to_input_order() {
    let mut view = TableView::new(
        people(),
        vec![ColumnDescriptor::new("age").sortable()],
        config(),
    );

    view.toggle_sort("age");
    assert_eq!(ids(view.visible_data()), vec![2, 3, 1]);
    view.toggle_sort("age");
    assert_eq!(ids(view.visible_data()), vec![1, 3, 2]);
    view.toggle_sort("age");
    assert_eq!(ids(view.visible_data()), vec![1, 2, 3]);
    assert!(std::ptr::eq(view.processed_data(), view.data()));
}

#[test]
fn test_table_sort_directions_apply() {
    let mut view = TableView::new(
        people(),
        vec![ColumnDescriptor::new("age").sortable()],
        config().with_sort_directions(vec![SortOrder::Descend]),
    );
    view.toggle_sort("age");
    assert_eq!(ids(view.visible_data()), vec![1, 3, 2]);
    view.toggle_sort("age");
    assert!(view.sort_states().iter().all(|s| s.order.is_none()));
}

#[test]
fn test_multiple_sort_uses_priority() {
    let data = vec![
        Record::new().set("id", 1).set("team", "b").set("age", 20),
        Record::new().set("id", 2).set("team", "a").set("age", 30),
        Record::new().set("id", 3).set("team", "a").set("age", 20),
        Record::new().set("id", 4).set("team", "b").set("age", 10),
    ];
    let columns = vec![
        ColumnDescriptor::new("age").sorter(Sorter::by_value().with_multiple(2)),
        ColumnDescriptor::new("team").sorter(Sorter::by_value().with_multiple(1)),
    ];
    let mut view = TableView::new(data, columns, config());
    view.set_sort("age", Some(SortOrder::Ascend));
    view.set_sort("team", Some(SortOrder::Ascend));

    assert_eq!(ids(view.visible_data()), vec![3, 2, 4, 1]);
    let sorter = &view.last_change().unwrap().sorter;
    let keys: Vec<&str> = sorter.iter().map(|s| s.column_key.as_str()).collect();
    assert_eq!(keys, vec!["team", "age"]);
}

#[test]
fn test_custom_comparator() {
    let by_name_length = Sorter::custom(|a: &Record, b: &Record| {
        let len = |r: &Record| r.get_string("name").ok().flatten().map_or(0, str::len);
        len(a).cmp(&len(b))
    });
    let mut view = TableView::new(
        people(),
        vec![ColumnDescriptor::new("name").sorter(by_name_length)],
        config(),
    );
    view.set_sort("name", Some(SortOrder::Descend));

    assert_eq!(ids(view.visible_data()), vec![1, 2, 3]);
}

#[test]
fn test_missing_values_sort_last() {
    let data = vec![
        Record::new().set("id", 1),
        Record::new().set("id", 2).set("age", 40),
        Record::new().set("id", 3).set("age", 10),
    ];
    let mut view = TableView::new(
        data,
        vec![ColumnDescriptor::new("age").sortable()],
        config(),
    );
    view.set_sort("age", Some(SortOrder::Ascend));
    assert_eq!(ids(view.visible_data()), vec![3, 2, 1]);

    view.set_sort("age", Some(SortOrder::Descend));
    assert_eq!(ids(view.visible_data()), vec![2, 3, 1]);
}

#[test]
fn test_children_sorted_per_level() {
    let data = vec![
        Record::new().set("id", 1).set("age", 50).with_children(
            "children",
            vec![
                Record::new().set("id", 11).set("age", 9),
                Record::new().set("id", 12).set("age", 3),
            ],
        ),
        Record::new().set("id", 2).set("age", 5),
    ];
    let original = data.clone();
    let mut view = TableView::new(
        data,
        vec![ColumnDescriptor::new("age").sortable()],
        config(),
    );
    view.set_sort("age", Some(SortOrder::Ascend));

    let visible = view.visible_data();
    assert_eq!(ids(visible), vec![2, 1]);
    assert_eq!(ids(visible[1].children("children").unwrap()), vec![12, 11]);
    assert_eq!(view.data(), original.as_slice());
}

#[test]
fn test_default_sort_order_seeds_state() {
    let columns = vec![
        ColumnDescriptor::new("age").sorter(Sorter::by_value().with_default_order(SortOrder::Descend)),
    ];
    let view = TableView::new(people(), columns, config());

    assert_eq!(ids(view.visible_data()), vec![1, 3, 2]);
    assert!(view.last_change().is_none());
}

#[test]
fn test_sort_keeps_current_page() {
    let data: Vec<Record> = (1..=25).map(|n| Record::new().set("id", n).set("age", n)).collect();
    let mut view = TableView::new(
        data,
        vec![ColumnDescriptor::new("age").sortable()],
        config(),
    );
    view.change_page(2, 10);
    view.toggle_sort("age");

    let event = view.last_change().unwrap();
    assert_eq!(event.pagination.as_ref().map(|p| p.current), Some(2));
    assert_eq!(view.pagination_state().map(|p| p.current), Some(2));
    assert_eq!(view.visible_data().len(), 10);
}
