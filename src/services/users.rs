use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::seed;
use super::{contains_folded, paginate, Latency, Page, ServiceError, DEFAULT_PAGE_SIZE};

static NATIONAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{10,14}$").expect("national id pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Inspector,
    SystemAdmin,
}

impl std::str::FromStr for UserRole {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Inspector" => Ok(Self::Inspector),
            "SystemAdmin" => Ok(Self::SystemAdmin),
            other => Err(ServiceError::invalid("role", format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub national_id: String,
    pub employee_id: String,
    pub role: UserRole,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub search: Option<String>,
    pub active_only: bool,
    pub page: usize,
    pub page_size: usize,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            search: None,
            active_only: false,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub national_id: String,
    pub employee_id: String,
    pub role: UserRole,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Email and verification status are not updatable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub employee_id: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

fn check_name(name: &str) -> Result<(), ServiceError> {
    if name.chars().count() < 3 {
        return Err(ServiceError::invalid("name", "must be at least 3 characters"));
    }
    Ok(())
}

fn check_national_id(id: &str) -> Result<(), ServiceError> {
    if !NATIONAL_ID.is_match(id) {
        return Err(ServiceError::invalid("nationalId", "must be 10 to 14 digits"));
    }
    Ok(())
}

impl NewUser {
    fn validate(&self) -> Result<(), ServiceError> {
        check_name(&self.name)?;
        if !self.email.contains('@') {
            return Err(ServiceError::invalid("email", "a valid email is required"));
        }
        check_national_id(&self.national_id)?;
        if self.employee_id.trim().is_empty() {
            return Err(ServiceError::invalid("employeeId", "is required"));
        }
        Ok(())
    }
}

impl UserUpdate {
    fn validate(&self) -> Result<(), ServiceError> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(id) = &self.national_id {
            check_national_id(id)?;
        }
        Ok(())
    }
}

/// One past the highest numeric id, so a delete never frees an id for reuse.
fn next_user_id(users: &[User]) -> String {
    let highest = users
        .iter()
        .filter_map(|u| u.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (highest + 1).to_string()
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn list(&self, query: UserQuery) -> Result<Page<User>, ServiceError>;
    async fn get(&self, id: &str) -> Result<User, ServiceError>;
    async fn create(&self, user: NewUser) -> Result<User, ServiceError>;
    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, ServiceError>;
    async fn delete(&self, id: &str) -> Result<(), ServiceError>;
    async fn toggle_active(&self, id: &str) -> Result<User, ServiceError>;
}

pub struct InMemoryUserService {
    users: RwLock<Vec<User>>,
    latency: Latency,
}

impl InMemoryUserService {
    pub fn new(users: Vec<User>, latency: Latency) -> Self {
        Self {
            users: RwLock::new(users),
            latency,
        }
    }

    pub fn seeded(latency: Latency) -> Result<Self, ServiceError> {
        Ok(Self::new(seed::users()?, latency))
    }
}

#[async_trait]
impl UserService for InMemoryUserService {
    async fn list(&self, query: UserQuery) -> Result<Page<User>, ServiceError> {
        self.latency.pause().await;
        let needle = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| (s, s.to_lowercase()));
        let matched = self
            .users
            .read()
            .await
            .iter()
            .filter(|u| !query.active_only || u.is_active)
            .filter(|u| match &needle {
                Some((raw, lower)) => {
                    contains_folded(&u.name, lower)
                        || contains_folded(&u.email, lower)
                        || u.national_id.contains(raw)
                        || contains_folded(&u.employee_id, lower)
                }
                None => true,
            })
            .cloned()
            .collect();
        Ok(paginate(matched, query.page, query.page_size))
    }

    async fn get(&self, id: &str) -> Result<User, ServiceError> {
        self.latency.pause().await;
        self.users
            .read()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| ServiceError::not_found("user", id))
    }

    async fn create(&self, user: NewUser) -> Result<User, ServiceError> {
        self.latency.pause().await;
        if let Err(e) = user.validate() {
            warn!(error = %e, "Rejected new user");
            return Err(e);
        }

        let mut users = self.users.write().await;
        let created = User {
            id: next_user_id(&users),
            name: user.name,
            email: user.email,
            national_id: user.national_id,
            employee_id: user.employee_id,
            role: user.role,
            is_active: user.is_active.unwrap_or(true),
            is_verified: false,
            created_at: Utc::now(),
        };
        users.push(created.clone());
        info!(user_id = %created.id, role = ?created.role, "User created");
        Ok(created)
    }

    async fn update(&self, id: &str, update: UserUpdate) -> Result<User, ServiceError> {
        self.latency.pause().await;
        update.validate()?;

        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ServiceError::not_found("user", id))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(national_id) = update.national_id {
            user.national_id = national_id;
        }
        if let Some(employee_id) = update.employee_id.filter(|e| !e.is_empty()) {
            user.employee_id = employee_id;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(active) = update.is_active {
            user.is_active = active;
        }

        info!(user_id = %id, "User updated");
        Ok(user.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        self.latency.pause().await;
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| ServiceError::not_found("user", id))?;
        users.remove(index);
        info!(user_id = %id, "User deleted");
        Ok(())
    }

    async fn toggle_active(&self, id: &str) -> Result<User, ServiceError> {
        self.latency.pause().await;
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| ServiceError::not_found("user", id))?;
        user.is_active = !user.is_active;
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> InMemoryUserService {
        InMemoryUserService::seeded(Latency::NONE).unwrap()
    }

    fn new_user() -> NewUser {
        NewUser {
            name: "سارة عبدالرحمن".into(),
            email: "sara@example.com".into(),
            national_id: "1029384756".into(),
            employee_id: "EMP004".into(),
            role: UserRole::Inspector,
            is_active: None,
        }
    }

    #[tokio::test]
    async fn created_users_start_unverified_and_active() {
        let user = service().create(new_user()).await.unwrap();
        assert_eq!(user.id, "4");
        assert!(user.is_active);
        assert!(!user.is_verified);
    }

    #[tokio::test]
    async fn ids_stay_unique_after_a_delete() {
        let svc = service();
        svc.delete("1").await.unwrap();

        let created = svc.create(new_user()).await.unwrap();

        assert_eq!(created.id, "4");
        let mut ids: Vec<String> = svc
            .list(UserQuery::default())
            .await
            .unwrap()
            .data
            .into_iter()
            .map(|u| u.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["2", "3", "4"]);
        assert!(svc.get("1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn create_rejects_bad_fields() {
        let svc = service();
        let cases = [
            NewUser { name: "اب".into(), ..new_user() },
            NewUser { email: "sara.example.com".into(), ..new_user() },
            NewUser { national_id: "123".into(), ..new_user() },
            NewUser { national_id: "12345abcde".into(), ..new_user() },
            NewUser { employee_id: " ".into(), ..new_user() },
        ];
        for case in cases {
            let err = svc.create(case).await.unwrap_err();
            assert!(matches!(err, ServiceError::Invalid { .. }));
        }
        assert_eq!(svc.list(UserQuery::default()).await.unwrap().total, 3);
    }

    #[test]
    fn unknown_role_does_not_parse() {
        assert!("Auditor".parse::<UserRole>().is_err());
        assert_eq!("SystemAdmin".parse::<UserRole>().unwrap(), UserRole::SystemAdmin);
    }

    #[tokio::test]
    async fn update_never_touches_email_or_verification() {
        let svc = service();
        let user = svc
            .update(
                "3",
                UserUpdate {
                    name: Some("محمد خالد".into()),
                    is_active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(user.email, "mohammed.otaibi@example.com");
        assert!(!user.is_verified);
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn active_only_and_delete() {
        let svc = service();
        let active = UserQuery {
            active_only: true,
            ..Default::default()
        };
        assert_eq!(svc.list(active.clone()).await.unwrap().total, 2);

        svc.delete("1").await.unwrap();
        assert_eq!(svc.list(active).await.unwrap().total, 1);
        assert!(svc.get("1").await.unwrap_err().is_not_found());
    }
}
