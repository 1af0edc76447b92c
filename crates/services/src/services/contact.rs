use db::models::validation::ValidationErrors;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils_core::links::whatsapp_url;

use super::config::SiteConfig;

#[derive(Debug, Clone, Deserialize, TS)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ContactLink {
    pub url: String,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars("name", &self.name, 1, "Nome é obrigatório");
        if !self.email.contains('@') {
            errors.push("email", "Email inválido");
        }
        errors.require_min_chars("phone", &self.phone, 1, "Telefone é obrigatório");
        errors.require_min_chars("message", &self.message, 1, "Mensagem é obrigatória");
        errors.into_result()
    }

    pub fn compose(&self) -> String {
        format!(
            "*Contato via Site*\n\n*Nome:* {}\n*Email:* {}\n*Telefone:* {}\n*Mensagem:* {}",
            self.name.trim(),
            self.email.trim(),
            self.phone.trim(),
            self.message.trim()
        )
    }
}

/// Prefilled WhatsApp chat with the organisation. Nothing is stored.
pub fn whatsapp_link(
    site: &SiteConfig,
    message: &ContactMessage,
) -> Result<ContactLink, ValidationErrors> {
    message.validate()?;
    Ok(ContactLink {
        url: whatsapp_url(&site.whatsapp_number, &message.compose()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_targets_configured_number_with_encoded_text() {
        let message = ContactMessage {
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: "88 9999".to_string(),
            message: "Quero ajudar!".to_string(),
        };
        let link = whatsapp_link(&SiteConfig::default(), &message).unwrap();
        assert!(link.url.starts_with("https://wa.me/5588994253039?text="));
        assert!(link.url.contains("text=*Contato%20via%20Site*%0A%0A*Nome%3A*%20Ana%0A"));
        assert!(link.url.ends_with("*Mensagem%3A*%20Quero%20ajudar%21"));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let message = ContactMessage {
            name: " ".to_string(),
            email: "nope".to_string(),
            phone: String::new(),
            message: String::new(),
        };
        let errors = whatsapp_link(&SiteConfig::default(), &message).unwrap_err();
        assert!(errors.has_field("name"));
        assert!(errors.has_field("email"));
        assert!(errors.has_field("phone"));
        assert!(errors.has_field("message"));
    }
}
