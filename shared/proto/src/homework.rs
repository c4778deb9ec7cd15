//! Homework backend: assignments, submissions and feedback.
//!
//! Assignment status is derived at read time, never stored; the `status`
//! field on [`Assignment`] is the derivation result.

use serde::{Deserialize, Serialize};
use tutorlink_rpc::{Channel, Metadata, Status};

use crate::Empty;

pub mod methods {
    pub const CREATE_ASSIGNMENT: &str = "homework.CreateAssignment";
    pub const GET_ASSIGNMENT: &str = "homework.GetAssignment";
    pub const UPDATE_ASSIGNMENT: &str = "homework.UpdateAssignment";
    pub const DELETE_ASSIGNMENT: &str = "homework.DeleteAssignment";
    pub const LIST_ASSIGNMENTS_BY_TUTOR: &str = "homework.ListAssignmentsByTutor";
    pub const LIST_ASSIGNMENTS_BY_STUDENT: &str = "homework.ListAssignmentsByStudent";
    pub const LIST_ASSIGNMENTS_BY_PAIR: &str = "homework.ListAssignmentsByPair";
    pub const CREATE_SUBMISSION: &str = "homework.CreateSubmission";
    pub const LIST_SUBMISSIONS: &str = "homework.ListSubmissions";
    pub const CREATE_FEEDBACK: &str = "homework.CreateFeedback";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Assignment {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub tutor_id: String,
    #[prost(string, tag = "3")]
    pub student_id: String,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[prost(string, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[prost(int64, optional, tag = "7")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
    #[prost(string, tag = "8")]
    pub status: String,
    #[prost(int64, tag = "9")]
    pub created_at: i64,
    #[prost(int64, tag = "10")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAssignmentRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[prost(string, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[prost(int64, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetAssignmentRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAssignmentRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[prost(int64, optional, tag = "5")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteAssignmentRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAssignmentsByTutorRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, repeated, tag = "2")]
    pub status_filter: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAssignmentsByStudentRequest {
    #[prost(string, tag = "1")]
    pub student_id: String,
    #[prost(string, repeated, tag = "2")]
    pub status_filter: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAssignmentsByPairRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
    #[prost(string, repeated, tag = "3")]
    pub status_filter: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListAssignmentsResponse {
    #[prost(message, repeated, tag = "1")]
    pub assignments: Vec<Assignment>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Submission {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub assignment_id: String,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[prost(int64, tag = "5")]
    pub created_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSubmissionRequest {
    #[prost(string, tag = "1")]
    pub assignment_id: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListSubmissionsRequest {
    #[prost(string, tag = "1")]
    pub assignment_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListSubmissionsResponse {
    #[prost(message, repeated, tag = "1")]
    pub submissions: Vec<Submission>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feedback {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub submission_id: String,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[prost(int64, tag = "5")]
    pub created_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateFeedbackRequest {
    #[prost(string, tag = "1")]
    pub submission_id: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[prost(string, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HomeworkClient {
    channel: Channel,
}

impl HomeworkClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub async fn create_assignment(
        &self,
        metadata: &Metadata,
        req: CreateAssignmentRequest,
    ) -> Result<Assignment, Status> {
        self.channel
            .call(methods::CREATE_ASSIGNMENT, metadata, &req)
            .await
    }

    pub async fn get_assignment(
        &self,
        metadata: &Metadata,
        req: GetAssignmentRequest,
    ) -> Result<Assignment, Status> {
        self.channel
            .call(methods::GET_ASSIGNMENT, metadata, &req)
            .await
    }

    pub async fn update_assignment(
        &self,
        metadata: &Metadata,
        req: UpdateAssignmentRequest,
    ) -> Result<Assignment, Status> {
        self.channel
            .call(methods::UPDATE_ASSIGNMENT, metadata, &req)
            .await
    }

    pub async fn delete_assignment(
        &self,
        metadata: &Metadata,
        req: DeleteAssignmentRequest,
    ) -> Result<Empty, Status> {
        self.channel
            .call(methods::DELETE_ASSIGNMENT, metadata, &req)
            .await
    }

    pub async fn list_assignments_by_tutor(
        &self,
        metadata: &Metadata,
        req: ListAssignmentsByTutorRequest,
    ) -> Result<ListAssignmentsResponse, Status> {
        self.channel
            .call(methods::LIST_ASSIGNMENTS_BY_TUTOR, metadata, &req)
            .await
    }

    pub async fn list_assignments_by_student(
        &self,
        metadata: &Metadata,
        req: ListAssignmentsByStudentRequest,
    ) -> Result<ListAssignmentsResponse, Status> {
        self.channel
            .call(methods::LIST_ASSIGNMENTS_BY_STUDENT, metadata, &req)
            .await
    }

    pub async fn list_assignments_by_pair(
        &self,
        metadata: &Metadata,
        req: ListAssignmentsByPairRequest,
    ) -> Result<ListAssignmentsResponse, Status> {
        self.channel
            .call(methods::LIST_ASSIGNMENTS_BY_PAIR, metadata, &req)
            .await
    }

    pub async fn create_submission(
        &self,
        metadata: &Metadata,
        req: CreateSubmissionRequest,
    ) -> Result<Submission, Status> {
        self.channel
            .call(methods::CREATE_SUBMISSION, metadata, &req)
            .await
    }

    pub async fn list_submissions(
        &self,
        metadata: &Metadata,
        req: ListSubmissionsRequest,
    ) -> Result<ListSubmissionsResponse, Status> {
        self.channel
            .call(methods::LIST_SUBMISSIONS, metadata, &req)
            .await
    }

    pub async fn create_feedback(
        &self,
        metadata: &Metadata,
        req: CreateFeedbackRequest,
    ) -> Result<Feedback, Status> {
        self.channel
            .call(methods::CREATE_FEEDBACK, metadata, &req)
            .await
    }
}
