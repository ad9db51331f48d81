//! Counter demo binary
//!
//! Demonstrates the uniflow state container with a two-slice state, the
//! stock logger and thunk middleware, and the no-change identity guarantee.

use uniflow_core::{combine, same_value, value, Action, CombinedState, ReducerMap};
use uniflow_runtime::{apply_middleware, builtin, create_store_with, Store, StoreError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn reducers() -> ReducerMap {
    ReducerMap::new()
        .with("count", |state, action| {
            let count = state
                .as_ref()
                .and_then(|s| s.downcast_ref::<i64>())
                .copied()
                .unwrap_or(0);
            match action.kind() {
                "INC" => Some(value(count + 1)),
                "DEC" => Some(value(count - 1)),
                _ => Some(state.unwrap_or_else(|| value(0_i64))),
            }
        })
        .with("last_kind", |state, action| match action.kind() {
            "INC" | "DEC" => Some(value(action.kind().to_owned())),
            _ => Some(state.unwrap_or_else(|| value(String::new()))),
        })
}

fn print_state(store: &Store, label: &str) {
    let Some(state) = store.state_as::<CombinedState>() else {
        println!("{label}: <state is not a CombinedState>");
        return;
    };
    let count = state.get_as::<i64>("count").copied().unwrap_or(0);
    let last = state
        .get_as::<String>("last_kind")
        .cloned()
        .unwrap_or_default();
    println!("{label}: count = {count}, last action = {last:?}");
}

fn main() -> Result<(), StoreError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter=debug,uniflow_runtime=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Counter Demo: uniflow ===\n");

    let store = create_store_with(
        combine(reducers()),
        None,
        apply_middleware(vec![builtin::logger(), builtin::thunk()]),
    )?;

    let subscription = store.subscribe(|| println!("  (subscriber notified)"));

    print_state(&store, "Initial state");

    println!("\n>>> Dispatching: INC");
    store.dispatch(Action::new("INC"))?;
    print_state(&store, "After INC");

    println!("\n>>> Dispatching: INC");
    store.dispatch(Action::new("INC"))?;
    print_state(&store, "After INC");

    println!("\n>>> Dispatching a thunk that decrements while positive");
    store.dispatch(builtin::thunk_action("drain", |api| {
        loop {
            let Some(state) = api.state_as::<CombinedState>() else {
                return Ok(());
            };
            let count = state.get_as::<i64>("count").copied().unwrap_or(0);
            if count <= 0 {
                return Ok(());
            }
            api.dispatch(Action::new("DEC"))?;
        }
    }))?;
    print_state(&store, "After thunk");

    println!("\n>>> Dispatching: UNKNOWN (no slice responds with a new value)");
    let before = store.state();
    store.dispatch(Action::new("UNKNOWN"))?;
    let after = store.state();
    print_state(&store, "After UNKNOWN");
    println!(
        "State identity preserved: {}",
        if same_value(&before, &after) { "yes" } else { "no" }
    );

    subscription.unsubscribe();
    println!("\n>>> Unsubscribed; further dispatches are silent");
    store.dispatch(Action::new("INC"))?;
    print_state(&store, "After final INC");

    println!("\n=== Demo Complete ===");
    println!("\nKey concepts demonstrated:");
    println!("  • ReducerMap: one reducer per state slice, combined into one transition");
    println!("  • Store: holds state, notifies subscribers after each change");
    println!("  • Middleware: logger and thunk wrap the dispatch path in order");
    println!("  • Thunks: function-valued actions that read state and re-dispatch");
    println!("  • Identity: unchanged dispatches return the same state allocation");
    Ok(())
}
