//! Browser automation.
//!
//! - [`driver`]: the async contract the persona runtime issues calls against
//! - [`scripts`]: fixed login and posting sequences built on that contract
//! - [`selectors`]: CSS selectors of the target site
//! - [`webdriver`]: W3C WebDriver implementation of the contract

pub mod driver;
pub mod scripts;
pub mod selectors;
mod webdriver;

pub use driver::{
    BrowserDriver, BrowserSession, ElementHandle, Key, Visibility, WaitPolicy,
};
pub use scripts::{login, post_content};
pub use webdriver::{WebDriver, WebDriverSession};
