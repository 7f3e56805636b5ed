//! Sportsbook demo binary
//!
//! Walks one shopper through the storefront: browse, search, sign in, fill
//! the cart, place a bet and sign out.

use anyhow::Context;
use sportsbook::{Config, Storefront};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sportsbook=info,wager_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let sport = config.storefront.default_sport.clone();
    let storefront = Storefront::from_config(&config).context("building storefront")?;
    let _auth = storefront.observe_auth_changes();

    println!("=== Sportsbook Storefront ===\n");

    println!(">>> Browsing {sport}");
    let events = storefront.load_events(&sport).await?;
    for event in &events {
        println!("  {} vs {} ({})", event.home_team, event.away_team, event.commence_time);
    }

    if let Some(first) = events.first() {
        println!("\n>>> Searching for {:?}", first.home_team);
        let found = storefront.search(&sport, &first.home_team).await?;
        println!("  {} matching event(s)", found.len());
    }

    println!("\n>>> Adding a selection while signed out");
    if let Some((event, bookmaker, market, outcome)) = first_outcome(&events) {
        match storefront.add_to_cart(event, bookmaker, market, outcome).await {
            Ok(_) => println!("  added"),
            Err(error) => println!("  refused: {error}"),
        }
    }

    println!("\n>>> Signing in");
    let identity = storefront.sign_in("demo.user@example.com", "password").await?;
    println!(
        "  signed in as {} ({})",
        identity.display_name.as_deref().unwrap_or("anonymous"),
        identity.uid
    );

    println!("\n>>> Filling the cart");
    for event in events.iter().take(3) {
        let detail = storefront.view_event(&sport, &event.id).await?;
        if let Some((event, bookmaker, market, outcome)) = first_outcome(std::slice::from_ref(&detail)) {
            let added = storefront.add_to_cart(event, bookmaker, market, outcome).await?;
            println!("  {} @ {:+} added: {added}", outcome.name, outcome.price);
        }
    }
    let cart = storefront.cart_state().await;
    println!(
        "  {} selection(s) across {} event(s), total price {}",
        cart.len(),
        cart.distinct_event_count(),
        cart.total_price()
    );

    println!("\n>>> Placing the bet");
    let receipt = storefront.place_bet().await?;
    println!("  receipt {} for {} selection(s)", receipt.receipt_id, receipt.selection_count);

    println!("\n>>> Signing out");
    storefront.sign_out().await?;
    let session = storefront.session_state().await;
    println!("  signed in: {}", session.is_authenticated());

    storefront
        .shutdown(config.storefront.shutdown_timeout())
        .await
        .context("shutting down")?;

    println!("\n=== Done ===");
    Ok(())
}

/// The first outcome of the first market of the first bookmaker
fn first_outcome(
    events: &[wager_odds::WageringEvent],
) -> Option<(
    &wager_odds::WageringEvent,
    &wager_odds::Bookmaker,
    &wager_odds::Market,
    &wager_odds::Outcome,
)> {
    let event = events.first()?;
    let bookmaker = event.bookmakers.first()?;
    let market = bookmaker.markets.first()?;
    let outcome = market.outcomes.first()?;
    Some((event, bookmaker, market, outcome))
}
