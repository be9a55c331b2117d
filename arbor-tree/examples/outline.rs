use arbor_tree::{FlatTree, NodeId, NodeType, TreeStore, records};
use env_logger::Env;

const SAMPLE: &str = r#"[
    { "NodeId": "A", "ParentId": null, "Name": "Groceries", "Type": 10 },
    { "NodeId": "B", "ParentId": "A", "Name": "Almond Meal flour", "Type": 1 },
    { "NodeId": "C", "ParentId": "A", "Name": "Organic eggs", "Type": 1 },
    { "NodeId": "D", "ParentId": null, "Name": "Reminders", "Type": 10 },
    { "NodeId": "E", "ParentId": "D", "Name": "Cook dinner", "Type": 3 }
]"#;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let input = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_owned(),
    };
    let records = records::from_json(&input)?;

    let mut store = TreeStore::new(&records);
    let flat = FlatTree::attach(&mut store);
    print_rows("loaded", &flat.borrow());

    let first_root = store.tree().roots().next().map(|n| n.id().clone());
    if let Some(first) = first_root {
        let added = store.insert_item(&first, "NEW NODE", NodeType::Concept)?;
        store.update_item(&added, "Fruit")?;
        print_rows("after insert", &flat.borrow());
    }

    let reminders = NodeId::from("D");
    if store.tree().contains(&reminders) {
        store.copy_paste_item_above(&reminders, &reminders)?;
        print_rows("after copy", &flat.borrow());
    }

    println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
    Ok(())
}

fn print_rows(title: &str, flat: &FlatTree) {
    println!("-- {title}");
    for row in flat.nodes() {
        let marker = if row.expandable { '+' } else { '-' };
        println!(
            "{:indent$}{marker} {} [{}]",
            "",
            row.name,
            row.node_type.code(),
            indent = row.level * 2
        );
    }
}
