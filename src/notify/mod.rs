pub mod telegram;

pub use telegram::TelegramNotifier;

use crate::error::DeliveryError;
use crate::models::Listing;
use async_trait::async_trait;

/// Delivers an alert about one listing to a messaging target
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Best-effort single delivery; `target` is backend specific (a chat id for Telegram)
    async fn notify(&self, listing: &Listing, target: &str) -> Result<(), DeliveryError>;
}

/// Render the HTML alert text for a new listing
pub fn format_message(listing: &Listing) -> String {
    let price = match listing.price {
        Some(euros) => format!("{euros} €"),
        None => "ei ilmoitettu".to_string(),
    };

    format!(
        "Uusi ilmoitus torilla!\n\n<b>{}</b>\n{}\nHinta: {}\n{}",
        html_escape::encode_text(&listing.title),
        html_escape::encode_text(&listing.description),
        price,
        listing.url,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: Option<u64>) -> Listing {
        Listing {
            url: "https://muusikoiden.net/tori/ilmoitus/42".to_string(),
            title: "Marshall <JCM800>".to_string(),
            description: "Putket & kaiutin vaihdettu".to_string(),
            price,
            created: "01.10.2026 10:00".to_string(),
            updated: None,
        }
    }

    #[test]
    fn message_contains_escaped_fields() {
        let text = format_message(&listing(Some(1450)));
        assert_eq!(
            text,
            "Uusi ilmoitus torilla!\n\n<b>Marshall &lt;JCM800&gt;</b>\nPutket &amp; kaiutin vaihdettu\nHinta: 1450 €\nhttps://muusikoiden.net/tori/ilmoitus/42"
        );
    }

    #[test]
    fn missing_price_is_spelled_out() {
        let text = format_message(&listing(None));
        assert!(text.contains("Hinta: ei ilmoitettu"));
    }
}
