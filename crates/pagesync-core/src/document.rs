//! Site content model
//!
//! The [`ContentDocument`] is the full structured copy for the site: hero
//! text, about section, testimonials, service packages, and contact info.
//! The presentation layer renders directly from this tree, so every section
//! must be present and populated after validation. Documents are replaced
//! wholesale on every sync or local save, never patched in place.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

/// Hero banner copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroSection {
    pub title: String,
    pub subtitle: String,
    /// Call-to-action button label
    pub cta_label: String,
}

/// About section copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutSection {
    pub heading: String,
    pub body: String,
}

/// A single customer testimonial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// A service package card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePackage {
    pub name: String,
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// Contact details shown in the footer and contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSection {
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// The full structured copy for the site
///
/// Every top-level field is required: deserializing an export that omits one
/// fails, and [`ContentDocument::validate`] additionally rejects documents
/// whose required strings are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    pub hero: HeroSection,
    pub about: AboutSection,
    pub testimonials: Vec<Testimonial>,
    pub packages: Vec<ServicePackage>,
    pub contact: ContactSection,
}

impl ContentDocument {
    /// Validate that every section the presentation layer needs is populated
    pub fn validate(&self) -> SyncResult<()> {
        fn require(field: &str, value: &str) -> SyncResult<()> {
            if value.trim().is_empty() {
                return Err(SyncError::Validation {
                    reason: format!("required field '{}' is empty", field),
                });
            }
            Ok(())
        }

        require("hero.title", &self.hero.title)?;
        require("hero.subtitle", &self.hero.subtitle)?;
        require("hero.cta_label", &self.hero.cta_label)?;
        require("about.heading", &self.about.heading)?;
        require("about.body", &self.about.body)?;
        require("contact.email", &self.contact.email)?;

        for (i, t) in self.testimonials.iter().enumerate() {
            require(&format!("testimonials[{}].quote", i), &t.quote)?;
            require(&format!("testimonials[{}].author", i), &t.author)?;
        }
        for (i, p) in self.packages.iter().enumerate() {
            require(&format!("packages[{}].name", i), &p.name)?;
            require(&format!("packages[{}].price", i), &p.price)?;
        }

        Ok(())
    }
}

impl Default for ContentDocument {
    /// Bundled default copy used until a remote or local document is applied
    fn default() -> Self {
        Self {
            hero: HeroSection {
                title: "Grow your business with us".to_string(),
                subtitle: "Marketing that actually moves the needle.".to_string(),
                cta_label: "Get started".to_string(),
            },
            about: AboutSection {
                heading: "Who we are".to_string(),
                body: "We are a small team helping local businesses tell their story online."
                    .to_string(),
            },
            testimonials: vec![Testimonial {
                quote: "They doubled our inbound leads in three months.".to_string(),
                author: "Dana R.".to_string(),
                role: Some("Owner, Riverside Cafe".to_string()),
            }],
            packages: vec![
                ServicePackage {
                    name: "Starter".to_string(),
                    description: "A landing page and monthly copy refresh.".to_string(),
                    price: "$450/mo".to_string(),
                    features: vec!["Landing page".to_string(), "Monthly updates".to_string()],
                },
                ServicePackage {
                    name: "Growth".to_string(),
                    description: "Full site, campaigns, and analytics reviews.".to_string(),
                    price: "$1,200/mo".to_string(),
                    features: vec![
                        "Full site".to_string(),
                        "Email campaigns".to_string(),
                        "Quarterly strategy".to_string(),
                    ],
                },
            ],
            contact: ContactSection {
                email: "hello@example.com".to_string(),
                phone: Some("(555) 010-0199".to_string()),
                address: None,
            },
        }
    }
}
