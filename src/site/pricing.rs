use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Billing {
    Monthly,
    Yearly,
}

impl fmt::Display for Billing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Billing::Monthly => f.write_str("monthly"),
            Billing::Yearly => f.write_str("yearly"),
        }
    }
}

/// Monthly/yearly switch on the pricing page. Each billing period owns one
/// group of price labels; exactly one group is shown at a time.
#[derive(Debug, Clone, Serialize)]
pub struct BillingToggle {
    billing: Billing,
}

impl Default for BillingToggle {
    fn default() -> Self {
        Self {
            billing: Billing::Monthly,
        }
    }
}

impl BillingToggle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn billing(&self) -> Billing {
        self.billing
    }

    /// Sets the switch; `yearly` mirrors the checkbox state.
    pub fn set_yearly(&mut self, yearly: bool) {
        self.billing = if yearly { Billing::Yearly } else { Billing::Monthly };
    }

    pub fn toggle(&mut self) {
        self.set_yearly(self.billing == Billing::Monthly);
    }

    pub fn is_visible(&self, group: Billing) -> bool {
        self.billing == group
    }

    /// Whether the period's label is highlighted.
    pub fn is_active(&self, label: Billing) -> bool {
        self.billing == label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    Plus,
    Minus,
}

/// Questions where at most one answer is open.
#[derive(Debug, Clone, Serialize)]
pub struct FaqAccordion {
    open: Vec<bool>,
}

impl FaqAccordion {
    pub fn new(items: usize) -> Self {
        Self {
            open: vec![false; items],
        }
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    /// Toggles item `index` and closes every other item. Out of range does nothing.
    pub fn click(&mut self, index: usize) {
        let Some(was_open) = self.open.get(index).copied() else {
            return;
        };
        for (i, open) in self.open.iter_mut().enumerate() {
            *open = i == index && !was_open;
        }
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.open.get(index).copied().unwrap_or(false)
    }

    pub fn icon(&self, index: usize) -> Icon {
        if self.is_open(index) { Icon::Minus } else { Icon::Plus }
    }

    pub fn open_item(&self) -> Option<usize> {
        self.open.iter().position(|&open| open)
    }
}

/// Registration link for a chosen plan and billing period.
pub fn subscription_url(plan: &str, billing: Billing) -> String {
    tracing::info!(plan, period = %billing, "plan selected");
    format!("register.html?plan={plan}&period={billing}")
}
