//! CSS selectors for the target site.

pub const USERNAME_INPUT: &str = r#"input[autocomplete="username"]"#;
/// Extra "confirm your username" step shown on some logins.
pub const VERIFICATION_INPUT: &str = r#"input[data-testid="ocfEnterTextTextInput"]"#;
pub const PASSWORD_INPUT: &str = r#"input[name="password"]"#;

/// Any of these appearing means the login went through.
pub const LOGGED_IN_INDICATORS: [&str; 3] = [
    r#"[data-testid="primaryColumn"]"#,
    r#"[data-testid="AppTabBar_Home_Link"]"#,
    r#"[aria-label="Home"]"#,
];

pub const COMPOSE_BUTTON: &str = r#"[data-testid="SideNav_NewTweet_Button"]"#;
pub const COMPOSER_TEXTAREA: &str = r#"[data-testid="tweetTextarea_0"]"#;
pub const SUBMIT_BUTTON: &str = r#"[data-testid="tweetButton"]"#;

pub const FEED_ITEM: &str = r#"[data-testid="tweet"]"#;
pub const ITEM_TEXT: &str = r#"[data-testid="tweetText"]"#;
pub const ITEM_AUTHOR: &str = r#"[data-testid="User-Name"] a"#;
pub const LIKE_BUTTON: &str = r#"[data-testid="like"]"#;
pub const RETWEET_BUTTON: &str = r#"[data-testid="retweet"]"#;
pub const RETWEET_CONFIRM: &str = r#"[data-testid="retweetConfirm"]"#;
pub const REPLY_BUTTON: &str = r#"[data-testid="reply"]"#;
