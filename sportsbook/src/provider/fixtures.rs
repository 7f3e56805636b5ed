//! Deterministic stand-in odds data.
//!
//! Six matchups per sport, two bookmakers each offering a single `h2h`
//! market. Prices come from a generator seeded by the sport key, so the
//! same sport always yields the same prices.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wager_odds::{Bookmaker, Market, Outcome, WageringEvent};

/// Sports with their own matchup table
pub const FIXTURE_SPORTS: [&str; 5] = ["soccer", "basketball", "americanfootball", "tennis", "hockey"];

const BOOKMAKERS: [(&str, &str); 2] = [("bet365", "Bet365"), ("draftkings", "DraftKings")];

struct SportTable {
    title: &'static str,
    matchups: [(&'static str, &'static str); 6],
}

const SOCCER: SportTable = SportTable {
    title: "Soccer",
    matchups: [
        ("Manchester United", "Liverpool"),
        ("Barcelona", "Real Madrid"),
        ("Bayern Munich", "Borussia Dortmund"),
        ("PSG", "Marseille"),
        ("Chelsea", "Arsenal"),
        ("AC Milan", "Inter Milan"),
    ],
};

const BASKETBALL: SportTable = SportTable {
    title: "Basketball",
    matchups: [
        ("Lakers", "Warriors"),
        ("Celtics", "Heat"),
        ("Bulls", "Knicks"),
        ("Nets", "76ers"),
        ("Suns", "Clippers"),
        ("Bucks", "Nuggets"),
    ],
};

const AMERICAN_FOOTBALL: SportTable = SportTable {
    title: "American Football",
    matchups: [
        ("Patriots", "Bills"),
        ("Chiefs", "Dolphins"),
        ("Cowboys", "Eagles"),
        ("Packers", "Vikings"),
        ("Rams", "49ers"),
        ("Steelers", "Ravens"),
    ],
};

const TENNIS: SportTable = SportTable {
    title: "Tennis",
    matchups: [
        ("Djokovic", "Nadal"),
        ("Federer", "Murray"),
        ("Medvedev", "Zverev"),
        ("Tsitsipas", "Rublev"),
        ("Sinner", "Alcaraz"),
        ("Ruud", "Norrie"),
    ],
};

const HOCKEY: SportTable = SportTable {
    title: "Hockey",
    matchups: [
        ("Maple Leafs", "Bruins"),
        ("Rangers", "Islanders"),
        ("Penguins", "Capitals"),
        ("Avalanche", "Golden Knights"),
        ("Lightning", "Panthers"),
        ("Oilers", "Flames"),
    ],
};

fn table(sport: &str) -> &'static SportTable {
    match sport {
        "basketball" => &BASKETBALL,
        "americanfootball" => &AMERICAN_FOOTBALL,
        "tennis" => &TENNIS,
        "hockey" => &HOCKEY,
        // Unknown sports reuse the soccer matchups under the requested key
        _ => &SOCCER,
    }
}

/// FNV-1a, stable across platforms and releases
fn seed_for(sport: &str) -> u64 {
    sport.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Generate the fixture events for `sport`, scheduled relative to `now`
#[must_use]
pub fn fixture_events(sport: &str, now: DateTime<Utc>) -> Vec<WageringEvent> {
    let table = table(sport);
    let mut rng = StdRng::seed_from_u64(seed_for(sport));

    (1_i64..)
        .zip(table.matchups.iter())
        .map(|(n, (home, away))| WageringEvent {
            id: format!("{sport}_{n}"),
            sport_key: sport.to_string(),
            sport_title: table.title.to_string(),
            commence_time: now + Duration::days(n),
            home_team: (*home).to_string(),
            away_team: (*away).to_string(),
            bookmakers: BOOKMAKERS
                .iter()
                .map(|(key, title)| Bookmaker {
                    key: (*key).to_string(),
                    title: (*title).to_string(),
                    last_update: now,
                    markets: vec![Market {
                        key: "h2h".to_string(),
                        last_update: now,
                        outcomes: vec![
                            Outcome {
                                name: (*home).to_string(),
                                price: rng.gen_range(100..300),
                                point: None,
                            },
                            Outcome {
                                name: (*away).to_string(),
                                price: rng.gen_range(100..300),
                                point: None,
                            },
                        ],
                    }],
                })
                .collect(),
        })
        .collect()
}

/// Look up one fixture event; unknown ids fall back to the first matchup
#[must_use]
pub fn fixture_event(sport: &str, event_id: &str, now: DateTime<Utc>) -> Option<WageringEvent> {
    let mut events = fixture_events(sport, now);
    match events.iter().position(|e| e.id == event_id) {
        Some(index) => Some(events.swap_remove(index)),
        None => events.into_iter().next(),
    }
}
