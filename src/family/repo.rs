use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Age bracket driving portion weights and toddler-suitability filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Adult,
    Teenager,
    Toddler,
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Adult => "adult",
            AgeGroup::Teenager => "teenager",
            AgeGroup::Toddler => "toddler",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "toddler" => AgeGroup::Toddler,
            "teenager" => AgeGroup::Teenager,
            _ => AgeGroup::Adult,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyMember {
    pub id: Uuid,
    pub name: String,
    pub age_group: AgeGroup,
}

#[derive(Debug, Clone, FromRow)]
struct FamilyMemberRow {
    id: Uuid,
    name: String,
    age_group: String,
}

impl From<FamilyMemberRow> for FamilyMember {
    fn from(row: FamilyMemberRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            age_group: AgeGroup::parse(&row.age_group),
        }
    }
}

pub async fn list(db: &PgPool) -> anyhow::Result<Vec<FamilyMember>> {
    let rows = sqlx::query_as::<_, FamilyMemberRow>(
        r#"
        SELECT id, name, age_group
        FROM family_members
        ORDER BY created_at
        "#,
    )
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(FamilyMember::from).collect())
}

pub async fn create(db: &PgPool, name: &str, age_group: AgeGroup) -> anyhow::Result<FamilyMember> {
    let row = sqlx::query_as::<_, FamilyMemberRow>(
        r#"
        INSERT INTO family_members (name, age_group)
        VALUES ($1, $2)
        RETURNING id, name, age_group
        "#,
    )
    .bind(name)
    .bind(age_group.as_str())
    .fetch_one(db)
    .await?;
    Ok(row.into())
}

/// Household used when no family members are stored yet, so planning keeps
/// working on a fresh install.
pub fn demo_family() -> Vec<FamilyMember> {
    let member = |name: &str, age_group| FamilyMember {
        id: Uuid::new_v4(),
        name: name.to_string(),
        age_group,
    };
    vec![
        member("Sandy", AgeGroup::Adult),
        member("René", AgeGroup::Adult),
        member("Tery", AgeGroup::Teenager),
        member("Warys", AgeGroup::Teenager),
        member("Kelly", AgeGroup::Teenager),
        member("Sophy", AgeGroup::Toddler),
    ]
}
