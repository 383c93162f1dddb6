//! Synthetic starter catalog, used when no food data file exists yet.

use std::ops::RangeInclusive;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::service::FoodInput;

/// Upper bound on the number of generated foods.
pub const SEED_CATALOG_SIZE: usize = 200;

/// One family of generated foods.
struct Family {
    category: &'static str,
    names: &'static [&'static str],
    suffix: Option<&'static str>,
    calories: RangeInclusive<i32>,
    allergens: &'static [&'static str],
}

const FAMILIES: &[Family] = &[
    Family {
        category: "Fruits",
        names: &[
            "Apple", "Banana", "Orange", "Strawberry", "Grape", "Mango", "Pineapple", "Kiwi",
            "Peach", "Pear", "Plum", "Cherry", "Blueberry", "Raspberry", "Blackberry", "Lemon",
            "Lime", "Grapefruit", "Mandarin", "Clementine", "Apricot", "Nectarine", "Fig",
            "Pomegranate", "Papaya", "Guava", "Lychee", "Passion fruit",
        ],
        suffix: None,
        calories: 30..=120,
        allergens: &[],
    },
    Family {
        category: "Vegetables",
        names: &[
            "Broccoli", "Spinach", "Carrot", "Tomato", "Cucumber", "Bell pepper", "Onion",
            "Garlic", "Cabbage", "Cauliflower", "Brussels sprouts", "Asparagus", "Green beans",
            "Peas", "Corn", "Zucchini", "Eggplant", "Sweet potato", "Potato", "Beetroot",
            "Radish", "Turnip", "Celery", "Fennel", "Artichoke", "Leek", "Shallot",
        ],
        suffix: None,
        calories: 15..=100,
        allergens: &[],
    },
    Family {
        category: "Meat",
        names: &[
            "Chicken", "Turkey", "Beef", "Pork", "Lamb", "Veal", "Duck", "Rabbit", "Venison",
            "Bison", "Goat", "Guinea fowl", "Quail", "Pheasant",
        ],
        suffix: Some("grilled"),
        calories: 120..=300,
        allergens: &[],
    },
    Family {
        category: "Fish",
        names: &[
            "Salmon", "Tuna", "Cod", "Haddock", "Hake", "Sea bass", "Sea bream", "Sole",
            "Turbot", "Sardine", "Anchovy", "Mackerel", "Herring", "Trout", "Perch", "Pike",
            "Monkfish",
        ],
        suffix: Some("baked"),
        calories: 100..=250,
        allergens: &["Fish"],
    },
    Family {
        category: "Grains",
        names: &["Wheat", "Barley", "Rye", "Spelt", "Couscous", "Bulgur"],
        suffix: Some("cooked"),
        calories: 80..=150,
        allergens: &["Gluten"],
    },
    Family {
        category: "Grains",
        names: &["Rice", "Oats", "Millet", "Quinoa", "Buckwheat", "Amaranth", "Teff"],
        suffix: Some("cooked"),
        calories: 80..=150,
        allergens: &[],
    },
    Family {
        category: "Nuts and Seeds",
        names: &[
            "Almond", "Walnut", "Hazelnut", "Pistachio", "Cashew", "Macadamia", "Pecan",
            "Brazil nut", "Pine nut", "Chestnut",
        ],
        suffix: None,
        calories: 150..=650,
        allergens: &["Nuts"],
    },
    Family {
        category: "Nuts and Seeds",
        names: &[
            "Sunflower seeds", "Pumpkin seeds", "Sesame seeds", "Flax seeds", "Chia seeds",
            "Hemp seeds",
        ],
        suffix: None,
        calories: 150..=600,
        allergens: &[],
    },
    Family {
        category: "Dairy",
        names: &[
            "Milk", "Yogurt", "Cheese", "Butter", "Cream", "Sour cream", "Kefir", "Goat milk",
            "Sheep milk",
        ],
        suffix: None,
        calories: 40..=400,
        allergens: &["Lactose"],
    },
    Family {
        category: "Legumes",
        names: &["Lentils", "Chickpeas", "Black beans", "Kidney beans", "Split peas"],
        suffix: Some("cooked"),
        calories: 100..=170,
        allergens: &[],
    },
];

/// Fixed extras that fit no generated family.
const EXTRAS: &[(&str, &str, i32, &[&str])] = &[
    ("Egg", "Eggs", 155, &["Egg"]),
    ("Tofu", "Plant Protein", 76, &["Soy"]),
    ("Tempeh", "Plant Protein", 192, &["Soy"]),
    ("Soy milk", "Plant Protein", 54, &["Soy"]),
];

/// Generate a shuffled starter catalog of at most [`SEED_CATALOG_SIZE`]
/// foods with distinct names.
pub fn generate_food_records<R: Rng + ?Sized>(rng: &mut R) -> Vec<FoodInput> {
    let mut records: Vec<FoodInput> = FAMILIES
        .iter()
        .flat_map(|family| family.names.iter().map(move |name| (family, *name)))
        .map(|(family, name)| FoodInput {
            name: match family.suffix {
                Some(suffix) => format!("{name}, {suffix}"),
                None => name.to_owned(),
            },
            category: family.category.to_owned(),
            calories: rng.random_range(family.calories.clone()),
            allergens: family.allergens.iter().map(|a| (*a).to_owned()).collect(),
            image_url: None,
        })
        .collect();

    records.extend(EXTRAS.iter().map(|(name, category, calories, allergens)| FoodInput {
        name: (*name).to_owned(),
        category: (*category).to_owned(),
        calories: *calories,
        allergens: allergens.iter().map(|a| (*a).to_owned()).collect(),
        image_url: None,
    }));

    records.shuffle(rng);
    records.truncate(SEED_CATALOG_SIZE);
    records
}

/// Serialize generated records in the data-file format read by
/// [`crate::loader::parse_food_records`].
pub fn render_food_records(records: &[FoodInput]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}
