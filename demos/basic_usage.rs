//! Basic dispatcher usage example
//!
//! Demonstrates a dispatcher with a stream backend, scoped tags and context,
//! and a second backend using the request-line formatter.
//!
//! Run with: cargo run --example basic_usage

use rust_dispatch_logger::prelude::*;
use rust_dispatch_logger::TemplateSpec;

fn main() -> Result<()> {
    println!("=== Rust Dispatch Logger - Basic Usage Example ===\n");

    // Default stream backend on stdout
    let logger = Dispatcher::builder("shop")
        .level(LogLevel::Debug)
        .template("[%<severity>s] [%<tags>s] %<message>s")
        .filters(["password"])
        .sink(SinkSpec::Stdout)
        .build()?;

    println!("1. Logging at different levels:");
    logger.debug("cache warmed");
    logger.info("server started");
    logger.warn_with("slow query", payload! { "table" => "orders", "ms" => 412 });
    logger.error("upstream unavailable");

    println!("\n2. Scoped tags and context:");
    logger.context().set("request_id", "req-42");
    logger.tagged(["api", "v2"], || {
        logger.info_with("login", payload! { "user" => "jane", "password" => "hunter2" });
    });
    logger.context().clear();
    logger.info("outside the scope");

    println!("\n3. Request lines through the rack formatter:");
    logger.add_backend(
        BackendOptions::new()
            .name("requests")
            .formatter("rack")
            .template(TemplateSpec::named("details"))
            .level(LogLevel::Info)
            .sink(SinkSpec::Stdout),
    )?;
    logger.info(payload! {
        "verb" => "GET",
        "status" => 200,
        "elapsed" => "3ms",
        "ip" => "127.0.0.1",
        "path" => "/orders",
        "length" => 312,
    });

    println!("\n4. Errors as messages:");
    let err = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
    logger.log_error(&err, payload! { "path" => "/etc/shop" });

    println!("\nBackends: {:?}", logger.backend_names());
    logger.close();

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
