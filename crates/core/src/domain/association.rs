use serde::{Deserialize, Serialize};

/// "If `antecedents` rise, `consequents` tend to rise", as mined by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl AssociationRule {
    pub fn label(&self) -> String {
        format!(
            "{} → {}",
            self.antecedents.join(", "),
            self.consequents.join(", ")
        )
    }
}
