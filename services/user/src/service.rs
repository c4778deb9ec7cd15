//! Business rules of the user backend. Every operation enforces its
//! authorization gate against the identity the transport attached to the
//! request context.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tutorlink_common::{DomainError, RequestContext};

use crate::authorization;
use crate::model::*;
use crate::repository::{TutorStudentRepository, UserRepository};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    tutor_students: Arc<dyn TutorStudentRepository>,
    telegram_auth_secret: String,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tutor_students: Arc<dyn TutorStudentRepository>,
        telegram_auth_secret: String,
    ) -> Self {
        Self {
            users,
            tutor_students,
            telegram_auth_secret,
        }
    }

    pub async fn register_via_telegram(
        &self,
        input: RegisterViaTelegramInput,
    ) -> Result<User, DomainError> {
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            role: input.role,
            auth_provider: AUTH_PROVIDER_TELEGRAM.to_string(),
            status: UserStatus::Active,
            first_name: input.first_name,
            last_name: input.last_name,
            timezone: input.timezone,
            created_at: now,
            edited_at: now,
        };
        let account = TelegramAccount {
            id: Uuid::now_v7(),
            user_id: user.id,
            telegram_id: input.telegram_id,
            username: input.username,
            created_at: now,
        };
        let profile = (input.role == Role::Tutor).then(|| TutorProfile {
            id: Uuid::now_v7(),
            user_id: user.id,
            payment_info: None,
            lesson_price_rub: None,
            lesson_connection_link: None,
            created_at: now,
            edited_at: now,
        });

        self.users
            .create_user_bundle(&user, &account, profile.as_ref())
            .await?;
        Ok(user)
    }

    /// Resolve an `Authorization` header value to the user it signs for.
    pub async fn authorize(&self, header: &str) -> Result<User, DomainError> {
        let Some(token) = header.strip_prefix("telegram") else {
            return Err(DomainError::Authentication(
                "unsupported authorization scheme".to_string(),
            ));
        };

        let telegram_id =
            authorization::telegram_id_from_token(&self.telegram_auth_secret, token.trim())?;
        let account = self
            .users
            .get_telegram_account_by_telegram_id(telegram_id)
            .await
            .map_err(|e| match e {
                DomainError::NotFound(_) => {
                    DomainError::Authentication("unknown telegram account".to_string())
                }
                other => other,
            })?;
        self.users.get_user(account.user_id).await
    }

    pub async fn get_me(&self, ctx: &RequestContext) -> Result<User, DomainError> {
        let id = ctx.user_id()?;
        self.users.get_user(id).await
    }

    pub async fn get_user_public(&self, id: Uuid) -> Result<User, DomainError> {
        self.users.get_user(id).await
    }

    pub async fn update_user(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        input: UpdateUserInput,
    ) -> Result<User, DomainError> {
        ctx.require_user_among(&[id])?;
        self.users.update_user(id, &input).await
    }

    pub async fn get_tutor_profile(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
    ) -> Result<TutorProfile, DomainError> {
        ctx.require_user_among(&[user_id])?;
        self.users.get_tutor_profile(user_id).await
    }

    pub async fn update_tutor_profile(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        input: UpdateTutorProfileInput,
    ) -> Result<TutorProfile, DomainError> {
        ctx.require_user_among(&[user_id])?;
        self.users.update_tutor_profile(user_id, &input).await
    }

    pub async fn create_tutor_student(
        &self,
        ctx: &RequestContext,
        input: CreateTutorStudentInput,
    ) -> Result<TutorStudent, DomainError> {
        ctx.require_user_among(&[input.tutor_id])?;
        ctx.require_role(Role::Tutor.as_str())?;

        let now = Utc::now();
        let ts = TutorStudent {
            id: Uuid::now_v7(),
            tutor_id: input.tutor_id,
            student_id: input.student_id,
            status: TutorStudentStatus::Invited,
            lesson_price_rub: input.lesson_price_rub,
            lesson_connection_link: input.lesson_connection_link,
            created_at: now,
            edited_at: now,
        };
        self.tutor_students.create(&ts).await?;
        Ok(ts)
    }

    pub async fn get_tutor_student(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<TutorStudent, DomainError> {
        ctx.require_user_among(&[tutor_id, student_id])?;
        self.tutor_students.get(tutor_id, student_id).await
    }

    pub async fn update_tutor_student(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
        input: UpdateTutorStudentInput,
    ) -> Result<TutorStudent, DomainError> {
        ctx.require_user_among(&[tutor_id])?;
        self.tutor_students.update(tutor_id, student_id, &input).await
    }

    pub async fn delete_tutor_student(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), DomainError> {
        ctx.require_user_among(&[tutor_id])?;
        self.tutor_students.delete(tutor_id, student_id).await
    }

    pub async fn list_tutor_students(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
    ) -> Result<Vec<TutorStudent>, DomainError> {
        ctx.require_user_among(&[tutor_id])?;
        self.tutor_students.list_by_tutor(tutor_id).await
    }

    pub async fn list_tutors_for_student(
        &self,
        ctx: &RequestContext,
        student_id: Uuid,
    ) -> Result<Vec<TutorStudent>, DomainError> {
        ctx.require_user_among(&[student_id])?;
        self.tutor_students.list_by_student(student_id).await
    }

    /// Pair context: per-pair price/link override the tutor defaults.
    pub async fn resolve_tutor_student_context(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
        student_id: Uuid,
    ) -> Result<TutorStudentContext, DomainError> {
        ctx.require_user_among(&[tutor_id, student_id])?;

        let profile = self.users.get_tutor_profile(tutor_id).await?;
        let ts = self.tutor_students.get(tutor_id, student_id).await?;

        Ok(TutorStudentContext {
            relationship_status: ts.status,
            lesson_price_rub: ts.lesson_price_rub.or(profile.lesson_price_rub),
            lesson_connection_link: ts
                .lesson_connection_link
                .or(profile.lesson_connection_link),
            payment_info: profile.payment_info,
        })
    }

    /// Student-side acceptance; accepting an already-active invitation is
    /// a no-op that stays active.
    pub async fn accept_invitation(
        &self,
        ctx: &RequestContext,
        tutor_id: Uuid,
    ) -> Result<(), DomainError> {
        let student_id = ctx.user_id()?;
        ctx.require_role(Role::Student.as_str())?;

        self.tutor_students
            .update(
                tutor_id,
                student_id,
                &UpdateTutorStudentInput {
                    status: Some(TutorStudentStatus::Active),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        users: Mutex<HashMap<Uuid, User>>,
        accounts: Mutex<HashMap<i64, TelegramAccount>>,
        profiles: Mutex<HashMap<Uuid, TutorProfile>>,
        pairs: Mutex<HashMap<(Uuid, Uuid), TutorStudent>>,
    }

    #[async_trait]
    impl UserRepository for MemoryStore {
        async fn create_user_bundle(
            &self,
            user: &User,
            account: &TelegramAccount,
            profile: Option<&TutorProfile>,
        ) -> Result<(), DomainError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(&account.telegram_id) {
                return Err(DomainError::AlreadyExists("telegram account".to_string()));
            }
            accounts.insert(account.telegram_id, account.clone());
            self.users.lock().unwrap().insert(user.id, user.clone());
            if let Some(profile) = profile {
                self.profiles
                    .lock()
                    .unwrap()
                    .insert(profile.user_id, profile.clone());
            }
            Ok(())
        }

        async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
            self.users
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("user".to_string()))
        }

        async fn update_user(
            &self,
            id: Uuid,
            input: &UpdateUserInput,
        ) -> Result<User, DomainError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .get_mut(&id)
                .ok_or_else(|| DomainError::NotFound("user".to_string()))?;
            if let Some(v) = &input.first_name {
                user.first_name = Some(v.clone());
            }
            if let Some(v) = &input.last_name {
                user.last_name = Some(v.clone());
            }
            if let Some(v) = &input.timezone {
                user.timezone = Some(v.clone());
            }
            user.edited_at = Utc::now();
            Ok(user.clone())
        }

        async fn get_tutor_profile(&self, user_id: Uuid) -> Result<TutorProfile, DomainError> {
            self.profiles
                .lock()
                .unwrap()
                .get(&user_id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("tutor profile".to_string()))
        }

        async fn update_tutor_profile(
            &self,
            user_id: Uuid,
            input: &UpdateTutorProfileInput,
        ) -> Result<TutorProfile, DomainError> {
            let mut profiles = self.profiles.lock().unwrap();
            let profile = profiles
                .get_mut(&user_id)
                .ok_or_else(|| DomainError::NotFound("tutor profile".to_string()))?;
            if let Some(v) = &input.payment_info {
                profile.payment_info = Some(v.clone());
            }
            if let Some(v) = input.lesson_price_rub {
                profile.lesson_price_rub = Some(v);
            }
            if let Some(v) = &input.lesson_connection_link {
                profile.lesson_connection_link = Some(v.clone());
            }
            Ok(profile.clone())
        }

        async fn get_telegram_account_by_telegram_id(
            &self,
            telegram_id: i64,
        ) -> Result<TelegramAccount, DomainError> {
            self.accounts
                .lock()
                .unwrap()
                .get(&telegram_id)
                .cloned()
                .ok_or_else(|| DomainError::NotFound("telegram account".to_string()))
        }
    }

    #[async_trait]
    impl TutorStudentRepository for MemoryStore {
        async fn create(&self, ts: &TutorStudent) -> Result<(), DomainError> {
            let mut pairs = self.pairs.lock().unwrap();
            let key = (ts.tutor_id, ts.student_id);
            if pairs.contains_key(&key) {
                return Err(DomainError::AlreadyExists("pair".to_string()));
            }
            pairs.insert(key, ts.clone());
            Ok(())
        }

        async fn get(
            &self,
            tutor_id: Uuid,
            student_id: Uuid,
        ) -> Result<TutorStudent, DomainError> {
            self.pairs
                .lock()
                .unwrap()
                .get(&(tutor_id, student_id))
                .cloned()
                .ok_or_else(|| DomainError::NotFound("pair".to_string()))
        }

        async fn update(
            &self,
            tutor_id: Uuid,
            student_id: Uuid,
            input: &UpdateTutorStudentInput,
        ) -> Result<TutorStudent, DomainError> {
            let mut pairs = self.pairs.lock().unwrap();
            let ts = pairs
                .get_mut(&(tutor_id, student_id))
                .ok_or_else(|| DomainError::NotFound("pair".to_string()))?;
            if let Some(v) = input.lesson_price_rub {
                ts.lesson_price_rub = Some(v);
            }
            if let Some(v) = &input.lesson_connection_link {
                ts.lesson_connection_link = Some(v.clone());
            }
            if let Some(v) = input.status {
                ts.status = v;
            }
            ts.edited_at = Utc::now();
            Ok(ts.clone())
        }

        async fn delete(&self, tutor_id: Uuid, student_id: Uuid) -> Result<(), DomainError> {
            self.pairs
                .lock()
                .unwrap()
                .remove(&(tutor_id, student_id))
                .map(|_| ())
                .ok_or_else(|| DomainError::NotFound("pair".to_string()))
        }

        async fn list_by_tutor(&self, tutor_id: Uuid) -> Result<Vec<TutorStudent>, DomainError> {
            Ok(self
                .pairs
                .lock()
                .unwrap()
                .values()
                .filter(|ts| ts.tutor_id == tutor_id)
                .cloned()
                .collect())
        }

        async fn list_by_student(
            &self,
            student_id: Uuid,
        ) -> Result<Vec<TutorStudent>, DomainError> {
            Ok(self
                .pairs
                .lock()
                .unwrap()
                .values()
                .filter(|ts| ts.student_id == student_id)
                .cloned()
                .collect())
        }
    }

    const SECRET: &str = "unit-secret";

    fn service() -> (UserService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::default());
        (
            UserService::new(store.clone(), store.clone(), SECRET.to_string()),
            store,
        )
    }

    fn ctx_for(id: Uuid, role: Role) -> RequestContext {
        RequestContext {
            user_id: Some(id.to_string()),
            user_role: Some(role.as_str().to_string()),
            trace_id: None,
        }
    }

    fn register_input(role: Role, telegram_id: i64) -> RegisterViaTelegramInput {
        RegisterViaTelegramInput {
            telegram_id,
            role,
            username: None,
            first_name: Some("Alice".to_string()),
            last_name: None,
            timezone: None,
        }
    }

    #[tokio::test]
    async fn tutor_sign_up_creates_a_profile() {
        let (service, store) = service();
        let user = service
            .register_via_telegram(register_input(Role::Tutor, 7))
            .await
            .unwrap();
        assert_eq!(user.role, Role::Tutor);
        assert!(store.profiles.lock().unwrap().contains_key(&user.id));
    }

    #[tokio::test]
    async fn student_sign_up_has_no_profile() {
        let (service, store) = service();
        let user = service
            .register_via_telegram(register_input(Role::Student, 8))
            .await
            .unwrap();
        assert!(store.profiles.lock().unwrap().is_empty());
        assert_eq!(user.status, UserStatus::Active);
    }

    #[tokio::test]
    async fn duplicate_sign_up_reports_already_exists() {
        let (service, _store) = service();
        service
            .register_via_telegram(register_input(Role::Student, 9))
            .await
            .unwrap();
        let err = service
            .register_via_telegram(register_input(Role::Student, 9))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn authorize_resolves_a_signed_token_to_the_user() {
        let (service, _store) = service();
        let user = service
            .register_via_telegram(register_input(Role::Tutor, 99))
            .await
            .unwrap();

        let token = authorization::sign_token(SECRET, 99, Utc::now().timestamp());
        let resolved = service.authorize(&format!("telegram {token}")).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn authorize_rejects_unknown_schemes_and_accounts() {
        let (service, _store) = service();
        assert!(matches!(
            service.authorize("bearer xyz").await,
            Err(DomainError::Authentication(_))
        ));

        let token = authorization::sign_token(SECRET, 12345, Utc::now().timestamp());
        assert!(matches!(
            service.authorize(&format!("telegram {token}")).await,
            Err(DomainError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn update_user_is_self_only() {
        let (service, _store) = service();
        let user = service
            .register_via_telegram(register_input(Role::Student, 1))
            .await
            .unwrap();
        let other = Uuid::now_v7();

        let err = service
            .update_user(
                &ctx_for(other, Role::Student),
                user.id,
                UpdateUserInput::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn create_tutor_student_requires_the_tutor_role() {
        let (service, _store) = service();
        let student = service
            .register_via_telegram(register_input(Role::Student, 2))
            .await
            .unwrap();

        let err = service
            .create_tutor_student(
                &ctx_for(student.id, Role::Student),
                CreateTutorStudentInput {
                    tutor_id: student.id,
                    student_id: Uuid::now_v7(),
                    lesson_price_rub: None,
                    lesson_connection_link: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn invitation_flow_reaches_active_and_stays_there() {
        let (service, _store) = service();
        let tutor = service
            .register_via_telegram(register_input(Role::Tutor, 3))
            .await
            .unwrap();
        let student = service
            .register_via_telegram(register_input(Role::Student, 4))
            .await
            .unwrap();

        let ts = service
            .create_tutor_student(
                &ctx_for(tutor.id, Role::Tutor),
                CreateTutorStudentInput {
                    tutor_id: tutor.id,
                    student_id: student.id,
                    lesson_price_rub: None,
                    lesson_connection_link: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(ts.status, TutorStudentStatus::Invited);

        // Only the student may accept.
        let err = service
            .accept_invitation(&ctx_for(tutor.id, Role::Tutor), tutor.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));

        let student_ctx = ctx_for(student.id, Role::Student);
        service
            .accept_invitation(&student_ctx, tutor.id)
            .await
            .unwrap();
        // Accepting twice is idempotent.
        service
            .accept_invitation(&student_ctx, tutor.id)
            .await
            .unwrap();

        let ts = service
            .get_tutor_student(&student_ctx, tutor.id, student.id)
            .await
            .unwrap();
        assert_eq!(ts.status, TutorStudentStatus::Active);
    }

    #[tokio::test]
    async fn pair_context_overrides_fall_back_to_profile_defaults() {
        let (service, _store) = service();
        let tutor = service
            .register_via_telegram(register_input(Role::Tutor, 5))
            .await
            .unwrap();
        let student = service
            .register_via_telegram(register_input(Role::Student, 6))
            .await
            .unwrap();

        let tutor_ctx = ctx_for(tutor.id, Role::Tutor);
        service
            .update_tutor_profile(
                &tutor_ctx,
                tutor.id,
                UpdateTutorProfileInput {
                    payment_info: Some("pay me".to_string()),
                    lesson_price_rub: Some(1000),
                    lesson_connection_link: Some("https://default.example".to_string()),
                },
            )
            .await
            .unwrap();
        service
            .create_tutor_student(
                &tutor_ctx,
                CreateTutorStudentInput {
                    tutor_id: tutor.id,
                    student_id: student.id,
                    lesson_price_rub: Some(1500),
                    lesson_connection_link: None,
                },
            )
            .await
            .unwrap();

        let context = service
            .resolve_tutor_student_context(&tutor_ctx, tutor.id, student.id)
            .await
            .unwrap();
        // The per-pair price wins; the link falls back to the default.
        assert_eq!(context.lesson_price_rub, Some(1500));
        assert_eq!(
            context.lesson_connection_link.as_deref(),
            Some("https://default.example")
        );
        assert_eq!(context.payment_info.as_deref(), Some("pay me"));
    }

    #[tokio::test]
    async fn missing_identity_is_denied_not_defaulted() {
        let (service, _store) = service();
        let err = service
            .get_me(&RequestContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authentication(_)));
    }
}
