use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// UUID v4, stored as text.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Trimmed, lowercased address.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    pub email_confirmed: bool,

    /// One-time token mailed at registration; cleared once used.
    pub confirmation_token: Option<String>,

    pub confirmation_expires_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
