use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{map_unique_violation, parse_enum, parse_uuid};
use crate::{
    db::{
        error::DbResult,
        repos::{OrganizationRepo, truncate_to_millis},
    },
    models::{CreateOrganization, OrgMember, OrgRole, Organization},
};

pub struct SqliteOrganizationRepo {
    pool: SqlitePool,
}

impl SqliteOrganizationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn parse_org(row: &sqlx::sqlite::SqliteRow) -> DbResult<Organization> {
        Ok(Organization {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            slug: row.get("slug"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        })
    }

    fn parse_member(row: &sqlx::sqlite::SqliteRow) -> DbResult<OrgMember> {
        Ok(OrgMember {
            org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
            user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
            role: parse_enum("role", &row.get::<String, _>("role"))?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl OrganizationRepo for SqliteOrganizationRepo {
    async fn create(&self, input: CreateOrganization) -> DbResult<Organization> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query("INSERT INTO organizations (id, slug, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(&input.slug)
            .bind(&input.name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_unique_violation(e, || {
                    format!("Organization with slug '{}' already exists", input.slug)
                })
            })?;

        Ok(Organization {
            id,
            slug: input.slug,
            name: input.name,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Organization>> {
        let row = sqlx::query("SELECT id, slug, name, created_at FROM organizations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::parse_org).transpose()
    }

    async fn list_all(&self) -> DbResult<Vec<Organization>> {
        let rows = sqlx::query(
            "SELECT id, slug, name, created_at FROM organizations ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_org).collect()
    }

    async fn add_member(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> DbResult<OrgMember> {
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query(
            r#"
            INSERT INTO organization_members (org_id, user_id, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(org_id.to_string())
        .bind(user_id.to_string())
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(e, || "User is already a member of this organization".into())
        })?;

        Ok(OrgMember {
            org_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_member(&self, org_id: Uuid, user_id: Uuid) -> DbResult<Option<OrgMember>> {
        let row = sqlx::query(
            r#"
            SELECT org_id, user_id, role, created_at, updated_at
            FROM organization_members
            WHERE org_id = ? AND user_id = ?
            "#,
        )
        .bind(org_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::parse_member).transpose()
    }

    async fn list_member_ids_with_role(
        &self,
        org_id: Uuid,
        role: OrgRole,
    ) -> DbResult<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT user_id FROM organization_members WHERE org_id = ? AND role = ? ORDER BY user_id",
        )
        .bind(org_id.to_string())
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("user_id")))
            .collect()
    }

    async fn update_member_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE organization_members
            SET role = ?, updated_at = ?
            WHERE org_id = ? AND user_id = ?
            "#,
        )
        .bind(role.as_str())
        .bind(truncate_to_millis(chrono::Utc::now()))
        .bind(org_id.to_string())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
