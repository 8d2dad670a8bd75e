//! Page interaction state for the marketing site, kept free of any rendering.

pub mod forms;
pub mod navigation;
pub mod pricing;
pub mod showcase;

pub use forms::{submit_form, validate_api_key};
pub use navigation::Navigation;
pub use pricing::{Billing, BillingToggle, FaqAccordion, subscription_url};
pub use showcase::{ClassInfo, ClassSelector, TestimonialSlider};
