pub const RECIPE_COUNT_PER_PAGE: i64 = 6;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 100;
pub const SUBSCRIPTION_COUNT_PER_PAGE: i64 = 6;

pub const FILE_SHOPPING_LIST: &str = "shopping_list.txt";

pub const DEFAULT_TAG_COLOR: &str = "#000000";

pub const MAX_LENGTH_NAME: usize = 100;
pub const MAX_LENGTH_TEXT: usize = 2000;
pub const MAX_LENGTH_EMAIL: usize = 254;
