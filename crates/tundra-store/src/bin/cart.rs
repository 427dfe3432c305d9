//! # Cart Command-Line Driver
//!
//! Drives a file-backed cart from the shell, for poking at stored carts
//! during development.
//!
//! ## Usage
//! ```bash
//! # Show the stored cart
//! cargo run -p tundra-store --bin cart -- show
//!
//! # Add one unit of a product
//! cargo run -p tundra-store --bin cart -- add parka 120.00 "Down Parka"
//!
//! # Change or remove lines
//! cargo run -p tundra-store --bin cart -- qty parka 3
//! cargo run -p tundra-store --bin cart -- remove parka
//! cargo run -p tundra-store --bin cart -- clear
//!
//! # Totals with estimated tax for a region
//! cargo run -p tundra-store --bin cart -- checkout NY
//!
//! # Use a specific config file
//! cargo run -p tundra-store --bin cart -- --config ./cart.toml show
//! ```
//!
//! Logging follows `RUST_LOG` (default: `info,tundra=debug`) and goes to stderr.

use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;
use tundra_core::tax::CheckoutAmounts;
use tundra_core::{Money, ProductInput};
use tundra_store::{
    CartEvent, CartEventKind, CartStore, EventBus, FileStorage, StoreConfig, StoreResult,
};

const USAGE: &str = "\
Tundra Cart

Usage: cart [--config <PATH>] <COMMAND>

Commands:
  show                        Print the stored cart
  add <ID> <PRICE> [TITLE]    Add one unit of a product
  remove <ID>                 Remove a line
  qty <ID> <N>                Set a line's quantity (0 removes it)
  clear                       Empty the cart
  checkout <REGION>           Print subtotal, tax and total

Options:
  -c, --config <PATH>    Config file (default: platform config dir)
  -h, --help             Show this help message";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut config_path: Option<PathBuf> = None;

    if let Some(pos) = args.iter().position(|a| a == "--config" || a == "-c") {
        if pos + 1 >= args.len() {
            return Err("--config needs a path".into());
        }
        config_path = Some(PathBuf::from(args.remove(pos + 1)));
        args.remove(pos);
    }

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut store = open_store(config_path)?;

    match (args[0].as_str(), &args[1..]) {
        ("show", []) => print_cart(&store),
        ("add", [id, price, rest @ ..]) => {
            let price: Money = price
                .parse()
                .map_err(|e| format!("invalid price '{}': {}", price, e))?;
            let mut product = ProductInput::new(id.as_str()).with_price(price);
            if !rest.is_empty() {
                product = product.with_title(rest.join(" "));
            }
            if !store.add_item(&product) {
                return Err(format!("could not add '{}'", id).into());
            }
            print_cart(&store);
        }
        ("remove", [id]) => {
            if !store.remove_item(id) {
                println!("'{}' is not in the cart", id);
            }
            print_cart(&store);
        }
        ("qty", [id, n]) => {
            let quantity: f64 = n
                .parse()
                .map_err(|e| format!("invalid quantity '{}': {}", n, e))?;
            if !store.update_quantity(id, quantity) {
                println!("'{}' was not updated", id);
            }
            print_cart(&store);
        }
        ("clear", []) => {
            store.clear();
            println!("Cart cleared");
        }
        ("checkout", [region]) => print_checkout(&store, region)?,
        _ => {
            eprintln!("{}", USAGE);
            return Err(format!("unrecognised command: {}", args.join(" ")).into());
        }
    }

    Ok(())
}

/// Opens the file-backed store from the configured data dir.
fn open_store(config_path: Option<PathBuf>) -> StoreResult<CartStore<FileStorage>> {
    let config = StoreConfig::load_or_default(config_path);
    let data_dir = config.resolved_data_dir()?;
    let storage = FileStorage::open(&data_dir)?;
    info!(data_dir = %data_dir.display(), "Using file storage");

    let mut events = EventBus::new();
    events.subscribe(CartEventKind::ItemAdded, |event: &CartEvent| {
        if let CartEvent::ItemAdded { product, cart } = event {
            let title = cart
                .find(&product.id)
                .map(|item| item.title.as_str())
                .unwrap_or(product.id.as_str());
            println!("{} added to cart!", title);
        }
        Ok(())
    });

    Ok(CartStore::init(storage, config, events))
}

fn print_checkout(store: &CartStore<FileStorage>, region: &str) -> StoreResult<()> {
    let order = store.prepare_checkout()?;
    for line in &order.items {
        println!("  {} x{}  {}", line.name, line.quantity, line.subtotal);
    }

    let amounts = CheckoutAmounts::compute(order.subtotal, region);
    println!("Subtotal: {}", amounts.subtotal);
    println!("Tax:      {}", amounts.tax);
    println!("Total:    {}", amounts.total);
    println!("[{}]", amounts.pay_label());
    Ok(())
}

fn print_cart(store: &CartStore<FileStorage>) {
    let summary = store.get_summary();
    if summary.items.is_empty() {
        println!("Your cart is empty");
        return;
    }

    for item in &summary.items {
        println!(
            "  {:<12} {:<28} x{:<4} {}",
            item.id,
            item.title,
            item.quantity,
            item.price.multiply_quantity(item.quantity)
        );
    }
    println!("{} item(s), total {}", summary.item_count, summary.total);
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show all debug logs
/// - `RUST_LOG=tundra=trace` - Show trace for tundra crates only
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tundra=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
