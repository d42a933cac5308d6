use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry for one type of loanable equipment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category: String,
    /// Nullable legacy column; `None` means a single unit.
    pub total_quantity: Option<i32>,
    pub description: Option<String>,
    /// Reference into external object storage; never resolved here.
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Effective physical stock: the legacy-data fallback treats a missing
    /// quantity as a single unit, and the total is never negative.
    pub fn effective_total(&self) -> i32 {
        self.total_quantity.unwrap_or(1).max(0)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservation,
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservation.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
            if let ActiveValue::NotSet = active_model.id {
                active_model.id = Set(Uuid::new_v4());
            }
        } else {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(total_quantity: Option<i32>) -> Model {
        Model {
            id: Uuid::new_v4(),
            name: "Camera X".into(),
            category: "cameras".into(),
            total_quantity,
            description: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn effective_total_defaults_missing_quantity_to_one() {
        assert_eq!(item(None).effective_total(), 1);
    }

    #[test]
    fn effective_total_is_never_negative() {
        assert_eq!(item(Some(-3)).effective_total(), 0);
    }

    #[test]
    fn effective_total_keeps_zero_and_positive() {
        assert_eq!(item(Some(0)).effective_total(), 0);
        assert_eq!(item(Some(5)).effective_total(), 5);
    }
}
