//! Two conditions, one action, and two rules run against the same engine.
//!
//! Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run --example simple -p sauron
//! ```

use sauron::prelude::*;
use serde_json::json;

/// Checks if first number is lower than the second
/// - lower_number: Number expected to be low
/// - greater_number: Number expected to be high
#[job]
fn first_condition(
    session: &mut Session,
    /// Number expected to be low
    #[arg(default = 10)]
    lower_number: i64,
    /// Number expected to be high
    #[arg(default = 20)]
    greater_number: i64,
) -> bool {
    session.insert("lower_number", lower_number);
    session.insert("greater_number", greater_number);
    lower_number < greater_number
}

/// Takes no argument and always returns true
#[job]
fn second_condition(_session: &mut Session) -> bool {
    true
}

/// Prints a statement asserting that the first number is lower than the second
#[job]
fn print_the_equation(session: &mut Session) {
    let lower = session.get_as::<i64>("lower_number").unwrap_or_default();
    let greater = session.get_as::<i64>("greater_number").unwrap_or_default();
    println!("{lower} < {greater} = {}", lower < greater);
}

fn main() -> Result<(), EngineError> {
    tracing_subscriber::fmt::init();

    let mut engine = Engine::new();
    engine.register_condition(FirstConditionJob, Some("First Condition"));
    engine.register_condition(SecondConditionJob, None);
    engine.register_action(
        PrintTheEquationJob,
        Some("The Action"),
        &["lower_number", "greater_number"],
    );

    let rule = json!({
        "conditions": [
            {"name": "first_condition", "args": {"lower_number": 3, "greater_number": 10}}
        ],
        "actions": [{"name": "print_the_equation"}]
    });
    let rule2 = json!({
        "conditions": [
            {"name": "first_condition", "args": {"lower_number": 30, "greater_number": -20}}
        ],
        "actions": [{"name": "print_the_equation"}]
    });

    engine.run(rule)?;
    engine.run(rule2)?;

    for result in engine.session().results() {
        println!("{} -> {}", result.job, result.output);
    }

    if let Exported::Text(yaml) = engine.export_metadata("yaml")? {
        println!("{yaml}");
    }

    Ok(())
}
