use quillplan_contract::book_plan_json_schema;

fn main() {
    let schema = book_plan_json_schema();
    let json = serde_json::to_string_pretty(&schema).expect("serialize book plan json schema");
    println!("{json}");
}
