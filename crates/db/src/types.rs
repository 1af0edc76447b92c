use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Lifecycle of a call for proposals as chosen by an editor.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum EditalStatus {
    #[default]
    #[sea_orm(string_value = "Aberto")]
    #[serde(rename = "Aberto")]
    #[strum(serialize = "Aberto")]
    Open,
    #[sea_orm(string_value = "Em andamento")]
    #[serde(rename = "Em andamento")]
    #[strum(serialize = "Em andamento")]
    InProgress,
    #[sea_orm(string_value = "Finalizado")]
    #[serde(rename = "Finalizado")]
    #[strum(serialize = "Finalizado")]
    Finished,
    #[sea_orm(string_value = "Cancelado")]
    #[serde(rename = "Cancelado")]
    #[strum(serialize = "Cancelado")]
    Cancelled,
}

impl EditalStatus {
    pub const ALL: [EditalStatus; 4] = [
        EditalStatus::Open,
        EditalStatus::InProgress,
        EditalStatus::Finished,
        EditalStatus::Cancelled,
    ];
}

/// Physical condition of an asset.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EstadoBem {
    #[sea_orm(string_value = "novo")]
    Novo,
    #[default]
    #[sea_orm(string_value = "bom")]
    Bom,
    #[sea_orm(string_value = "regular")]
    Regular,
    #[sea_orm(string_value = "danificado")]
    Danificado,
    #[sea_orm(string_value = "inservivel")]
    Inservivel,
}

impl EstadoBem {
    pub fn label(&self) -> &'static str {
        match self {
            EstadoBem::Novo => "Novo",
            EstadoBem::Bom => "Bom",
            EstadoBem::Regular => "Regular",
            EstadoBem::Danificado => "Danificado",
            EstadoBem::Inservivel => "Inservível",
        }
    }
}

/// Asset category.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    TS,
    EnumString,
    Display,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum TipoBem {
    #[sea_orm(string_value = "Tecnologia / TI")]
    #[serde(rename = "Tecnologia / TI")]
    #[strum(serialize = "Tecnologia / TI")]
    Tecnologia,
    #[sea_orm(string_value = "Móveis e Utensílios")]
    #[serde(rename = "Móveis e Utensílios")]
    #[strum(serialize = "Móveis e Utensílios")]
    Moveis,
    #[sea_orm(string_value = "Veículos")]
    #[serde(rename = "Veículos")]
    #[strum(serialize = "Veículos")]
    Veiculos,
    #[sea_orm(string_value = "Máquinas e Equipamentos")]
    #[serde(rename = "Máquinas e Equipamentos")]
    #[strum(serialize = "Máquinas e Equipamentos")]
    Maquinas,
    #[sea_orm(string_value = "Imóveis")]
    #[serde(rename = "Imóveis")]
    #[strum(serialize = "Imóveis")]
    Imoveis,
    #[sea_orm(string_value = "Outros")]
    #[serde(rename = "Outros")]
    #[strum(serialize = "Outros")]
    Outros,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn edital_status_uses_portuguese_labels() {
        assert_eq!(EditalStatus::InProgress.to_string(), "Em andamento");
        assert_eq!(
            EditalStatus::from_str("Cancelado").unwrap(),
            EditalStatus::Cancelled
        );
        assert_eq!(
            serde_json::to_string(&EditalStatus::Finished).unwrap(),
            "\"Finalizado\""
        );
    }

    #[test]
    fn tipo_bem_round_trips_through_labels() {
        let tipo: TipoBem = serde_json::from_str("\"Tecnologia / TI\"").unwrap();
        assert_eq!(tipo, TipoBem::Tecnologia);
        assert_eq!(TipoBem::Moveis.to_string(), "Móveis e Utensílios");
    }

    #[test]
    fn estado_bem_is_lowercase_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&EstadoBem::Inservivel).unwrap(),
            "\"inservivel\""
        );
        assert_eq!(EstadoBem::Inservivel.label(), "Inservível");
        assert_eq!(EstadoBem::default(), EstadoBem::Bom);
    }
}
