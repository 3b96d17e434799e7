use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::DbResult,
        repos::{ProjectRepo, truncate_to_millis},
    },
    models::{CreateProject, CreateProjectRole, Project, ProjectRole, ProjectRoleGrant},
};

pub struct SqliteProjectRepo {
    pool: SqlitePool,
}

impl SqliteProjectRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepo for SqliteProjectRepo {
    async fn create(&self, org_id: Uuid, input: CreateProject) -> DbResult<Project> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query("INSERT INTO projects (id, org_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(org_id.to_string())
            .bind(&input.name)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(Project {
            id,
            org_id,
            name: input.name,
            created_at: now,
        })
    }

    async fn first_project_id(&self, org_id: Uuid) -> DbResult<Option<Uuid>> {
        let row = sqlx::query(
            "SELECT id FROM projects WHERE org_id = ? ORDER BY created_at ASC, id ASC LIMIT 1",
        )
        .bind(org_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| parse_uuid(&row.get::<String, _>("id")))
            .transpose()
    }

    async fn create_role(&self, org_id: Uuid, input: CreateProjectRole) -> DbResult<ProjectRole> {
        let id = Uuid::new_v4();
        let now = truncate_to_millis(chrono::Utc::now());

        sqlx::query("INSERT INTO project_roles (id, org_id, name, created_at) VALUES (?, ?, ?, ?)")
            .bind(id.to_string())
            .bind(org_id.to_string())
            .bind(&input.name)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(ProjectRole {
            id,
            org_id,
            name: input.name,
            created_at: now,
        })
    }

    async fn get_role(&self, org_id: Uuid, role_id: Uuid) -> DbResult<Option<ProjectRole>> {
        let row = sqlx::query(
            "SELECT id, org_id, name, created_at FROM project_roles WHERE id = ? AND org_id = ?",
        )
        .bind(role_id.to_string())
        .bind(org_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ProjectRole {
                id: parse_uuid(&row.get::<String, _>("id"))?,
                org_id: parse_uuid(&row.get::<String, _>("org_id"))?,
                name: row.get("name"),
                created_at: row.get("created_at"),
            })),
            None => Ok(None),
        }
    }

    async fn list_role_holder_ids(&self, org_id: Uuid, role_id: Uuid) -> DbResult<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT pm.user_id
            FROM project_members pm
            JOIN projects p ON p.id = pm.project_id
            WHERE p.org_id = ? AND pm.role_id = ?
            ORDER BY pm.user_id
            "#,
        )
        .bind(org_id.to_string())
        .bind(role_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_uuid(&row.get::<String, _>("user_id")))
            .collect()
    }

    async fn find_project_with_role(
        &self,
        org_id: Uuid,
        role_id: Uuid,
    ) -> DbResult<Option<Uuid>> {
        let row = sqlx::query(
            r#"
            SELECT pm.project_id
            FROM project_members pm
            JOIN projects p ON p.id = pm.project_id
            WHERE p.org_id = ? AND pm.role_id = ?
            ORDER BY pm.created_at ASC, pm.project_id ASC
            LIMIT 1
            "#,
        )
        .bind(org_id.to_string())
        .bind(role_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| parse_uuid(&row.get::<String, _>("project_id")))
            .transpose()
    }

    async fn grant_role(&self, project_id: Uuid, user_id: Uuid, role_id: Uuid) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO project_members (project_id, user_id, role_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(project_id.to_string())
        .bind(user_id.to_string())
        .bind(role_id.to_string())
        .bind(truncate_to_millis(chrono::Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_role(&self, org_id: Uuid, role_id: Uuid, user_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM project_members
            WHERE role_id = ? AND user_id = ?
              AND project_id IN (SELECT id FROM projects WHERE org_id = ?)
            "#,
        )
        .bind(role_id.to_string())
        .bind(user_id.to_string())
        .bind(org_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn list_role_grants(
        &self,
        org_id: Uuid,
        role_id: Uuid,
    ) -> DbResult<Vec<ProjectRoleGrant>> {
        let rows = sqlx::query(
            r#"
            SELECT pm.project_id, pm.user_id, pm.role_id
            FROM project_members pm
            JOIN projects p ON p.id = pm.project_id
            WHERE p.org_id = ? AND pm.role_id = ?
            ORDER BY pm.created_at ASC, pm.project_id ASC, pm.user_id ASC
            "#,
        )
        .bind(org_id.to_string())
        .bind(role_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProjectRoleGrant {
                    project_id: parse_uuid(&row.get::<String, _>("project_id"))?,
                    user_id: parse_uuid(&row.get::<String, _>("user_id"))?,
                    role_id: parse_uuid(&row.get::<String, _>("role_id"))?,
                })
            })
            .collect()
    }
}
