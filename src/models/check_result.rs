use serde::{Deserialize, Serialize};

/// Availability signals read from the target element on one page fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    pub exists: bool,
    pub text: String,
    pub says_add_to_cart: bool,
    pub locked: bool,
}

impl CheckResult {
    /// Result for a page without the target element. Absence counts as locked.
    pub fn missing() -> Self {
        Self {
            exists: false,
            text: String::new(),
            says_add_to_cart: false,
            locked: true,
        }
    }

    /// The item can be bought: element present, labelled "add to cart", not locked.
    pub fn is_available(&self) -> bool {
        self.exists && self.says_add_to_cart && !self.locked
    }
}
