//! User backend: accounts, telegram bindings, tutor profiles and
//! tutor-student relationships.

use serde::{Deserialize, Serialize};
use tutorlink_rpc::{Channel, Metadata, Status};

use crate::Empty;

pub mod methods {
    pub const REGISTER_VIA_TELEGRAM: &str = "user.RegisterViaTelegram";
    pub const AUTHORIZE_BY_AUTH_HEADER: &str = "user.AuthorizeByAuthHeader";
    pub const GET_ME: &str = "user.GetMe";
    pub const GET_USER: &str = "user.GetUser";
    pub const UPDATE_USER: &str = "user.UpdateUser";
    pub const GET_TUTOR_PROFILE: &str = "user.GetTutorProfileByUserId";
    pub const UPDATE_TUTOR_PROFILE: &str = "user.UpdateTutorProfile";
    pub const CREATE_TUTOR_STUDENT: &str = "user.CreateTutorStudent";
    pub const GET_TUTOR_STUDENT: &str = "user.GetTutorStudent";
    pub const UPDATE_TUTOR_STUDENT: &str = "user.UpdateTutorStudent";
    pub const DELETE_TUTOR_STUDENT: &str = "user.DeleteTutorStudent";
    pub const LIST_TUTOR_STUDENTS: &str = "user.ListTutorStudents";
    pub const LIST_TUTORS_FOR_STUDENT: &str = "user.ListTutorsForStudent";
    pub const RESOLVE_TUTOR_STUDENT_CONTEXT: &str = "user.ResolveTutorStudentContext";
    pub const ACCEPT_INVITATION: &str = "user.AcceptInvitationFromTutor";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub role: String,
    #[prost(string, tag = "3")]
    pub auth_provider: String,
    #[prost(string, tag = "4")]
    pub status: String,
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[prost(string, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[prost(string, optional, tag = "7")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[prost(int64, tag = "8")]
    pub created_at: i64,
    #[prost(int64, tag = "9")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPublic {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub role: String,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterViaTelegramRequest {
    #[prost(string, tag = "1")]
    pub role: String,
    #[prost(int64, tag = "2")]
    pub telegram_id: i64,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[prost(string, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizeByAuthHeaderRequest {
    #[prost(string, tag = "1")]
    pub authorization_header: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetUserRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorProfile {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub user_id: String,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<String>,
    #[prost(int32, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_price_rub: Option<i32>,
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_connection_link: Option<String>,
    #[prost(int64, tag = "6")]
    pub created_at: i64,
    #[prost(int64, tag = "7")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetTutorProfileRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTutorProfileRequest {
    #[prost(string, tag = "1")]
    pub user_id: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<String>,
    #[prost(int32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_price_rub: Option<i32>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_connection_link: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorStudent {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub tutor_id: String,
    #[prost(string, tag = "3")]
    pub student_id: String,
    #[prost(string, tag = "4")]
    pub status: String,
    #[prost(int32, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_price_rub: Option<i32>,
    #[prost(string, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_connection_link: Option<String>,
    #[prost(int64, tag = "7")]
    pub created_at: i64,
    #[prost(int64, tag = "8")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTutorStudentRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
    #[prost(int32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_price_rub: Option<i32>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_connection_link: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetTutorStudentRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTutorStudentRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
    #[prost(int32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_price_rub: Option<i32>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_connection_link: Option<String>,
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteTutorStudentRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTutorStudentsRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTutorsForStudentRequest {
    #[prost(string, tag = "1")]
    pub student_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListTutorStudentsResponse {
    #[prost(message, repeated, tag = "1")]
    pub students: Vec<TutorStudent>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolveTutorStudentContextRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
}

/// The pair context: per-pair overrides resolved over tutor-profile
/// defaults for price, connection link and payment instructions.
#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TutorStudentContext {
    #[prost(string, tag = "1")]
    pub relationship_status: String,
    #[prost(int32, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_price_rub: Option<i32>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_connection_link: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceptInvitationRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
}

#[derive(Debug, Clone)]
pub struct UserClient {
    channel: Channel,
}

impl UserClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub async fn register_via_telegram(
        &self,
        metadata: &Metadata,
        req: RegisterViaTelegramRequest,
    ) -> Result<User, Status> {
        self.channel
            .call(methods::REGISTER_VIA_TELEGRAM, metadata, &req)
            .await
    }

    pub async fn authorize_by_auth_header(
        &self,
        metadata: &Metadata,
        req: AuthorizeByAuthHeaderRequest,
    ) -> Result<User, Status> {
        self.channel
            .call(methods::AUTHORIZE_BY_AUTH_HEADER, metadata, &req)
            .await
    }

    pub async fn get_me(&self, metadata: &Metadata, req: Empty) -> Result<User, Status> {
        self.channel.call(methods::GET_ME, metadata, &req).await
    }

    pub async fn get_user(
        &self,
        metadata: &Metadata,
        req: GetUserRequest,
    ) -> Result<UserPublic, Status> {
        self.channel.call(methods::GET_USER, metadata, &req).await
    }

    pub async fn update_user(
        &self,
        metadata: &Metadata,
        req: UpdateUserRequest,
    ) -> Result<User, Status> {
        self.channel.call(methods::UPDATE_USER, metadata, &req).await
    }

    pub async fn get_tutor_profile(
        &self,
        metadata: &Metadata,
        req: GetTutorProfileRequest,
    ) -> Result<TutorProfile, Status> {
        self.channel
            .call(methods::GET_TUTOR_PROFILE, metadata, &req)
            .await
    }

    pub async fn update_tutor_profile(
        &self,
        metadata: &Metadata,
        req: UpdateTutorProfileRequest,
    ) -> Result<TutorProfile, Status> {
        self.channel
            .call(methods::UPDATE_TUTOR_PROFILE, metadata, &req)
            .await
    }

    pub async fn create_tutor_student(
        &self,
        metadata: &Metadata,
        req: CreateTutorStudentRequest,
    ) -> Result<TutorStudent, Status> {
        self.channel
            .call(methods::CREATE_TUTOR_STUDENT, metadata, &req)
            .await
    }

    pub async fn get_tutor_student(
        &self,
        metadata: &Metadata,
        req: GetTutorStudentRequest,
    ) -> Result<TutorStudent, Status> {
        self.channel
            .call(methods::GET_TUTOR_STUDENT, metadata, &req)
            .await
    }

    pub async fn update_tutor_student(
        &self,
        metadata: &Metadata,
        req: UpdateTutorStudentRequest,
    ) -> Result<TutorStudent, Status> {
        self.channel
            .call(methods::UPDATE_TUTOR_STUDENT, metadata, &req)
            .await
    }

    pub async fn delete_tutor_student(
        &self,
        metadata: &Metadata,
        req: DeleteTutorStudentRequest,
    ) -> Result<Empty, Status> {
        self.channel
            .call(methods::DELETE_TUTOR_STUDENT, metadata, &req)
            .await
    }

    pub async fn list_tutor_students(
        &self,
        metadata: &Metadata,
        req: ListTutorStudentsRequest,
    ) -> Result<ListTutorStudentsResponse, Status> {
        self.channel
            .call(methods::LIST_TUTOR_STUDENTS, metadata, &req)
            .await
    }

    pub async fn list_tutors_for_student(
        &self,
        metadata: &Metadata,
        req: ListTutorsForStudentRequest,
    ) -> Result<ListTutorStudentsResponse, Status> {
        self.channel
            .call(methods::LIST_TUTORS_FOR_STUDENT, metadata, &req)
            .await
    }

    pub async fn resolve_tutor_student_context(
        &self,
        metadata: &Metadata,
        req: ResolveTutorStudentContextRequest,
    ) -> Result<TutorStudentContext, Status> {
        self.channel
            .call(methods::RESOLVE_TUTOR_STUDENT_CONTEXT, metadata, &req)
            .await
    }

    pub async fn accept_invitation(
        &self,
        metadata: &Metadata,
        req: AcceptInvitationRequest,
    ) -> Result<Empty, Status> {
        self.channel
            .call(methods::ACCEPT_INVITATION, metadata, &req)
            .await
    }
}
