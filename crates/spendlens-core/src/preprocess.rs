//! Text preprocessing for transaction notifications.
//!
//! Deterministic utilities shared by the training pipeline and the cascade:
//! amount extraction (₹ / Rs / INR with Indian digit grouping), recipient and
//! merchant extraction, and the clean-text pipeline the model tiers consume.
//! `clean` is idempotent on realistic notification text, so precomputed and
//! lazily-computed clean variants agree.

use once_cell::sync::Lazy;
use regex::Regex;

/// App/wallet tokens stripped from model input. Order matters: removal is
/// sequential substring replacement.
const NOISE_TOKENS: &[&str] = &[
    "google", "pay", "gpay", "phonepe", "using", "via", "gp", "upi", "paytm",
];

static AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:₹|rs\.?|inr)?\s*([\d,]+(?:\.\d{1,2})?)").unwrap());

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9 ]").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{10}\b").unwrap());
static UPI_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[\w.-]+@\w+\b").unwrap());

/// `paid to X`, `sent to X`, etc. — the capture stops at the wallet suffix.
static MERCHANT_RES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"paid to (.+?)(?: using| via| with|$)",
        r"paid at (.+?)(?: using| via| with|$)",
        r"sent to (.+?)(?: using| via| with|$)",
        r"received from (.+?)(?: using| via| with|$)",
        r"credited from (.+?)(?: using| via| with|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Clean raw notification text for the model tiers.
///
/// Lowercases, strips punctuation and currency marks, removes wallet noise
/// tokens, and collapses whitespace.
pub fn clean(text: &str) -> String {
    let mut t = text.to_lowercase();
    t = NON_ALNUM_RE.replace_all(&t, " ").into_owned();
    for noise in NOISE_TOKENS {
        t = t.replace(noise, "");
    }
    SPACES_RE.replace_all(&t, " ").trim().to_string()
}

/// Extract the transaction amount from raw text.
///
/// Handles `₹389`, `Rs 389`, `RS. 2,499.00`, `INR 1200`, and Indian-grouped
/// values like `1,20,000.50`. The first numeric match wins.
pub fn extract_amount(text: &str) -> Option<f64> {
    let captures = AMOUNT_RE.captures(text)?;
    let digits = captures.get(1)?.as_str().replace(',', "");
    digits.parse::<f64>().ok()
}

/// Drop wallet tokens from a merchant name.
pub fn cleanup_merchant(name: &str) -> String {
    const BAD_WORDS: &[&str] = &["google", "pay", "gpay", "upi", "using", "via", "gp"];
    name.to_lowercase()
        .split_whitespace()
        .filter(|part| !BAD_WORDS.contains(part))
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Extract the recipient or merchant from raw text.
///
/// Credits resolve to `"You"`. Otherwise tries merchant phrases first, then a
/// 10-digit phone number, then a UPI handle, and finally `"Unknown"`.
pub fn extract_recipient(text: &str) -> String {
    let t = text.to_lowercase();
    let t = t.trim();

    const CREDIT_KEYWORDS: &[&str] = &["received", "credited", "deposit", "refunded", "reversed"];
    if CREDIT_KEYWORDS.iter().any(|kw| t.contains(kw)) {
        return "You".to_string();
    }

    const REMOVE_WORDS: &[&str] = &[
        "google pay",
        "gpay",
        "phonepe",
        "paytm",
        "upi",
        "transaction",
        "ref",
        "refno",
        "using",
        "via",
    ];

    for re in MERCHANT_RES.iter() {
        if let Some(captures) = re.captures(t)
            && let Some(m) = captures.get(1)
        {
            let mut raw = m.as_str().trim().to_string();
            for w in REMOVE_WORDS {
                raw = raw.replace(w, "").trim().to_string();
            }
            // Merchant names rarely run past two words; the rest is noise.
            let cleaned = raw
                .split_whitespace()
                .take(2)
                .collect::<Vec<_>>()
                .join(" ");
            return if cleaned.is_empty() { raw } else { cleaned };
        }
    }

    if let Some(phone) = PHONE_RE.find(t) {
        return phone.as_str().to_string();
    }
    if let Some(upi) = UPI_ID_RE.find(t) {
        return upi.as_str().to_string();
    }

    "Unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_currency_prefixes() {
        assert_eq!(extract_amount("₹389 paid to Amazon"), Some(389.0));
        assert_eq!(extract_amount("Rs 389 debited"), Some(389.0));
        assert_eq!(extract_amount("RS. 2,499.00 at Flipkart"), Some(2499.0));
        assert_eq!(extract_amount("INR 1200 transferred"), Some(1200.0));
    }

    #[test]
    fn amount_indian_grouping() {
        assert_eq!(extract_amount("sent 1,20,000.50 today"), Some(120_000.50));
    }

    #[test]
    fn amount_absent() {
        assert_eq!(extract_amount("no numbers here"), None);
        assert_eq!(extract_amount(""), None);
    }

    #[test]
    fn clean_strips_wallet_noise() {
        assert_eq!(
            clean("₹389 paid to Amazon via GPay"),
            "389 paid to amazon g"
        );
    }

    #[test]
    fn clean_idempotent_on_notifications() {
        for raw in [
            "₹389 paid to 8697704326 using Google Pay",
            "₹850 paid at McDonald's using Google Pay",
            "Rs. 1250 paid at FirstCry for kids essentials",
            "Sent ₹500 to Rahul Sharma via UPI",
        ] {
            let once = clean(raw);
            assert_eq!(clean(&once), once, "clean not idempotent for {raw:?}");
        }
    }

    #[test]
    fn recipient_credit_is_you() {
        assert_eq!(extract_recipient("₹120 cashback credited to account"), "You");
        assert_eq!(extract_recipient("Amount refunded for order"), "You");
    }

    #[test]
    fn recipient_merchant_phrase() {
        assert_eq!(
            extract_recipient("₹850 paid at McDonald's using Google Pay"),
            "mcdonald's"
        );
        assert_eq!(
            extract_recipient("₹389 paid to 8697704326 using Google Pay"),
            "8697704326"
        );
    }

    #[test]
    fn recipient_merchant_truncated_to_two_words() {
        assert_eq!(
            extract_recipient("Rs 300 paid to Sharma General Stores with card"),
            "sharma general"
        );
    }

    #[test]
    fn recipient_phone_and_upi_fallbacks() {
        assert_eq!(extract_recipient("debit of 500 towards 9876543210"), "9876543210");
        assert_eq!(
            extract_recipient("autopay to netflix.bill@okaxis done"),
            "netflix.bill@okaxis"
        );
        assert_eq!(extract_recipient("some odd text"), "Unknown");
    }

    #[test]
    fn merchant_cleanup() {
        assert_eq!(cleanup_merchant("Amazon via GPay"), "amazon");
        assert_eq!(cleanup_merchant("Rahul Sharma upi"), "rahul sharma");
    }
}
