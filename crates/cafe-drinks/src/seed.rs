//! First-run contents of the catalogue and the recommendation rules.

use crate::drink::{NewDrink, TemperatureLevel};
use crate::rules::NewRule;

const HOT: &[&str] = &[
    "Espresso",
    "Cappuccino",
    "Latte",
    "Americano",
    "Ristretto",
    "Mocha",
    "Hot chocolate",
    "Black tea",
    "Green tea",
    "Herbal tea",
];

const WARM: &[&str] = &[
    "Iced latte with milk foam",
    "Coffee with milk",
    "Matcha latte",
    "Oolong tea",
    "Ginger tea",
];

const COLD: &[&str] = &[
    "Iced tea",
    "Frappuccino",
    "Virgin mojito",
    "Cold brew",
    "Fresh orange juice",
    "Lemonade",
    "Smoothie",
    "Still water",
    "Sparkling water",
    "Iced latte",
];

/// The fixed drink list: hot, then warm, then cold.
pub fn default_catalogue() -> Vec<NewDrink> {
    let tagged = |names: &[&str], level| {
        names
            .iter()
            .map(move |name| NewDrink::new(*name, level))
            .collect::<Vec<_>>()
    };

    let mut drinks = tagged(HOT, TemperatureLevel::Hot);
    drinks.extend(tagged(WARM, TemperatureLevel::Warm));
    drinks.extend(tagged(COLD, TemperatureLevel::Cold));
    drinks
}

/// Default rules, most specific first. Lookup takes the first match, so a
/// reading of exactly 10°C or 20°C lands in the warmer band.
pub fn default_rules() -> Vec<NewRule> {
    vec![
        NewRule::new(
            20.0,
            60.0,
            Some("clear sky"),
            "Sunny and hot: something iced will hit the spot.",
            &["Lemonade", "Iced tea", "Frappuccino"],
        ),
        NewRule::new(
            20.0,
            60.0,
            None,
            "Warm out there: cool down with a cold drink.",
            &["Cold brew", "Iced latte", "Virgin mojito"],
        ),
        NewRule::new(
            10.0,
            20.0,
            Some("rain"),
            "Mild but rainy: a warm cup to carry along.",
            &["Coffee with milk", "Ginger tea"],
        ),
        NewRule::new(
            10.0,
            20.0,
            None,
            "Mild weather: a warm drink is just right.",
            &["Matcha latte", "Oolong tea", "Coffee with milk"],
        ),
        NewRule::new(
            -60.0,
            10.0,
            Some("snow"),
            "Snowing: time for hot chocolate.",
            &["Hot chocolate", "Mocha"],
        ),
        NewRule::new(
            -60.0,
            10.0,
            None,
            "Cold outside: warm up with something hot.",
            &["Cappuccino", "Latte", "Herbal tea"],
        ),
    ]
}
