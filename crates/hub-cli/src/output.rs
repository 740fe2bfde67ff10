use hub_client::{PaginatedList, Record};
use hub_common::Entity;
use serde_json::Value;

fn field<'a>(entity: &'a Entity, key: &str) -> &'a str {
    entity.get(key).and_then(Value::as_str).unwrap_or("")
}

pub fn print_page(list: &PaginatedList) {
    println!(
        "\n=== {}s (page {}/{}) ===\n",
        capitalize(list.name()),
        list.current_page() + 1,
        list.total_pages()
    );
    if list.results().is_empty() {
        println!("No {}s found.", list.name());
        return;
    }
    println!("{:<25} {:<35} {:<20}", "ID", "Name", "Created");
    println!("{:-<80}", "");
    for entity in list.results() {
        println!(
            "{:<25} {:<35} {:<20}",
            field(entity, "id"),
            field(entity, "name"),
            field(entity, "createdAt"),
        );
    }
    println!();
}

pub fn print_record(record: &Record) {
    let name = record.crud().name();
    let Some(id) = record.id() else {
        println!("No {name} selected.");
        return;
    };
    println!("\n=== {} {} ===\n", capitalize(name), id);
    if record.data().is_empty() {
        println!("  (no data)");
    } else {
        let data = Value::Object(record.data().clone());
        println!("{}", serde_json::to_string_pretty(&data).unwrap_or_default());
    }
    println!();
}

/// `✓`/`✗` line for a call that either returned a response or did not.
pub fn report<T>(outcome: Option<T>, done: &str, failed: &str) {
    match outcome {
        Some(_) => println!("✓ {done}"),
        None => eprintln!("✗ {failed}"),
    }
}

pub fn print_link(object: &str, link: Option<String>) {
    match link {
        Some(url) => println!("{object}: {url}"),
        None => eprintln!("✗ No {object} link available"),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
