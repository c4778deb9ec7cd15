//! Schedule backend: slots, lessons and the booking operations.

use serde::{Deserialize, Serialize};
use tutorlink_rpc::{Channel, Metadata, Status};

use crate::Empty;

pub mod methods {
    pub const CREATE_SLOT: &str = "schedule.CreateSlot";
    pub const GET_SLOT: &str = "schedule.GetSlot";
    pub const UPDATE_SLOT: &str = "schedule.UpdateSlot";
    pub const DELETE_SLOT: &str = "schedule.DeleteSlot";
    pub const LIST_SLOTS_BY_TUTOR: &str = "schedule.ListSlotsByTutor";
    pub const CREATE_LESSON: &str = "schedule.CreateLesson";
    pub const GET_LESSON: &str = "schedule.GetLesson";
    pub const UPDATE_LESSON: &str = "schedule.UpdateLesson";
    pub const CANCEL_LESSON: &str = "schedule.CancelLesson";
    pub const LIST_LESSONS_BY_TUTOR: &str = "schedule.ListLessonsByTutor";
    pub const LIST_LESSONS_BY_STUDENT: &str = "schedule.ListLessonsByStudent";
    pub const LIST_LESSONS_BY_PAIR: &str = "schedule.ListLessonsByPair";
    pub const LIST_COMPLETED_UNPAID_LESSONS: &str = "schedule.ListCompletedUnpaidLessons";
    pub const MARK_AS_PAID: &str = "schedule.MarkAsPaid";
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Slot {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub tutor_id: String,
    #[prost(int64, tag = "3")]
    pub starts_at: i64,
    #[prost(int64, tag = "4")]
    pub ends_at: i64,
    #[prost(bool, tag = "5")]
    pub is_booked: bool,
    #[prost(int64, tag = "6")]
    pub created_at: i64,
    #[prost(int64, tag = "7")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSlotRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(int64, tag = "2")]
    pub starts_at: i64,
    #[prost(int64, tag = "3")]
    pub ends_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetSlotRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSlotRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(int64, tag = "2")]
    pub starts_at: i64,
    #[prost(int64, tag = "3")]
    pub ends_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteSlotRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListSlotsByTutorRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(bool, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_available: Option<bool>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListSlotsResponse {
    #[prost(message, repeated, tag = "1")]
    pub slots: Vec<Slot>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Lesson {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub slot_id: String,
    #[prost(string, tag = "3")]
    pub student_id: String,
    #[prost(string, tag = "4")]
    pub status: String,
    #[prost(bool, tag = "5")]
    pub is_paid: bool,
    #[prost(string, optional, tag = "6")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_link: Option<String>,
    #[prost(int32, optional, tag = "7")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_rub: Option<i32>,
    #[prost(string, optional, tag = "8")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<String>,
    #[prost(int64, tag = "9")]
    pub created_at: i64,
    #[prost(int64, tag = "10")]
    pub edited_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateLessonRequest {
    #[prost(string, tag = "1")]
    pub slot_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GetLessonRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateLessonRequest {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, optional, tag = "2")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_link: Option<String>,
    #[prost(int32, optional, tag = "3")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_rub: Option<i32>,
    #[prost(string, optional, tag = "4")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CancelLessonRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListLessonsByTutorRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, repeated, tag = "2")]
    pub status_filter: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListLessonsByStudentRequest {
    #[prost(string, tag = "1")]
    pub student_id: String,
    #[prost(string, repeated, tag = "2")]
    pub status_filter: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListLessonsByPairRequest {
    #[prost(string, tag = "1")]
    pub tutor_id: String,
    #[prost(string, tag = "2")]
    pub student_id: String,
    #[prost(string, repeated, tag = "3")]
    pub status_filter: Vec<String>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListCompletedUnpaidLessonsRequest {
    #[prost(int64, optional, tag = "1")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<i64>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListLessonsResponse {
    #[prost(message, repeated, tag = "1")]
    pub lessons: Vec<Lesson>,
}

#[derive(Clone, PartialEq, ::prost::Message, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkAsPaidRequest {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct ScheduleClient {
    channel: Channel,
}

impl ScheduleClient {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }

    pub async fn create_slot(
        &self,
        metadata: &Metadata,
        req: CreateSlotRequest,
    ) -> Result<Slot, Status> {
        self.channel.call(methods::CREATE_SLOT, metadata, &req).await
    }

    pub async fn get_slot(&self, metadata: &Metadata, req: GetSlotRequest) -> Result<Slot, Status> {
        self.channel.call(methods::GET_SLOT, metadata, &req).await
    }

    pub async fn update_slot(
        &self,
        metadata: &Metadata,
        req: UpdateSlotRequest,
    ) -> Result<Slot, Status> {
        self.channel.call(methods::UPDATE_SLOT, metadata, &req).await
    }

    pub async fn delete_slot(
        &self,
        metadata: &Metadata,
        req: DeleteSlotRequest,
    ) -> Result<Empty, Status> {
        self.channel.call(methods::DELETE_SLOT, metadata, &req).await
    }

    pub async fn list_slots_by_tutor(
        &self,
        metadata: &Metadata,
        req: ListSlotsByTutorRequest,
    ) -> Result<ListSlotsResponse, Status> {
        self.channel
            .call(methods::LIST_SLOTS_BY_TUTOR, metadata, &req)
            .await
    }

    pub async fn create_lesson(
        &self,
        metadata: &Metadata,
        req: CreateLessonRequest,
    ) -> Result<Lesson, Status> {
        self.channel
            .call(methods::CREATE_LESSON, metadata, &req)
            .await
    }

    pub async fn get_lesson(
        &self,
        metadata: &Metadata,
        req: GetLessonRequest,
    ) -> Result<Lesson, Status> {
        self.channel.call(methods::GET_LESSON, metadata, &req).await
    }

    pub async fn update_lesson(
        &self,
        metadata: &Metadata,
        req: UpdateLessonRequest,
    ) -> Result<Lesson, Status> {
        self.channel
            .call(methods::UPDATE_LESSON, metadata, &req)
            .await
    }

    pub async fn cancel_lesson(
        &self,
        metadata: &Metadata,
        req: CancelLessonRequest,
    ) -> Result<Lesson, Status> {
        self.channel
            .call(methods::CANCEL_LESSON, metadata, &req)
            .await
    }

    pub async fn list_lessons_by_tutor(
        &self,
        metadata: &Metadata,
        req: ListLessonsByTutorRequest,
    ) -> Result<ListLessonsResponse, Status> {
        self.channel
            .call(methods::LIST_LESSONS_BY_TUTOR, metadata, &req)
            .await
    }

    pub async fn list_lessons_by_student(
        &self,
        metadata: &Metadata,
        req: ListLessonsByStudentRequest,
    ) -> Result<ListLessonsResponse, Status> {
        self.channel
            .call(methods::LIST_LESSONS_BY_STUDENT, metadata, &req)
            .await
    }

    pub async fn list_lessons_by_pair(
        &self,
        metadata: &Metadata,
        req: ListLessonsByPairRequest,
    ) -> Result<ListLessonsResponse, Status> {
        self.channel
            .call(methods::LIST_LESSONS_BY_PAIR, metadata, &req)
            .await
    }

    pub async fn list_completed_unpaid_lessons(
        &self,
        metadata: &Metadata,
        req: ListCompletedUnpaidLessonsRequest,
    ) -> Result<ListLessonsResponse, Status> {
        self.channel
            .call(methods::LIST_COMPLETED_UNPAID_LESSONS, metadata, &req)
            .await
    }

    pub async fn mark_as_paid(
        &self,
        metadata: &Metadata,
        req: MarkAsPaidRequest,
    ) -> Result<Lesson, Status> {
        self.channel.call(methods::MARK_AS_PAID, metadata, &req).await
    }
}
