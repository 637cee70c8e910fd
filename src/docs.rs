use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::signup,
		routes::auth::login,
		routes::auth::me,
		routes::auth::logout,
		routes::organizations::list_organizations,
		routes::organizations::create_organization,
		routes::organizations::get_organization,
		routes::organizations::delete_organization,
		routes::staff::list_staff,
		routes::staff::create_staff,
		routes::staff::get_staff,
		routes::staff::update_staff,
		routes::staff::delete_staff,
		routes::students::list_students,
		routes::students::create_student,
		routes::students::get_student,
		routes::students::update_student,
		routes::students::delete_student,
		routes::courses::list_courses,
		routes::courses::create_course,
		routes::courses::delete_course,
		routes::attendance::list_attendance,
		routes::attendance::mark_attendance,
		routes::leaves::list_leaves,
		routes::leaves::create_leave,
		routes::leaves::review_leave,
		routes::results::list_results,
		routes::results::create_result
	),
	components(
		schemas(
			authz::Role,
			routes::health::HealthResponse,
			routes::auth::MessageResponse,
			models::user::User,
			models::user::AuthResponse,
			models::user::LoginRequest,
			models::user::SignupRequest,
			models::organization::Organization,
			models::organization::OrganizationCreateRequest,
			models::staff::Staff,
			models::staff::StaffCreateRequest,
			models::staff::StaffUpdateRequest,
			models::student::Student,
			models::student::StudentCreateRequest,
			models::student::StudentUpdateRequest,
			models::course::Course,
			models::course::CourseCreateRequest,
			models::attendance::Attendance,
			models::attendance::AttendanceStatus,
			models::attendance::AttendanceMarkRequest,
			models::leave::LeaveRequest,
			models::leave::LeaveStatus,
			models::leave::LeaveCreateRequest,
			models::leave::LeaveReviewRequest,
			models::exam_result::ExamResult,
			models::exam_result::ExamResultCreateRequest
		)
	),
	tags(
		(name = "Health", description = "Liveness and database reachability"),
		(name = "Auth", description = "Signup, login and session cookie handling"),
		(name = "Organizations", description = "Tenants, managed by the super admin"),
		(name = "Staff", description = "Staff records"),
		(name = "Students", description = "Student records"),
		(name = "Courses", description = "Courses and subjects"),
		(name = "Attendance", description = "Daily attendance"),
		(name = "Leaves", description = "Leave requests and reviews"),
		(name = "Results", description = "Exam results")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn ensure_security_components(doc: &mut Value) {
	let Some(root) = doc.as_object_mut() else {
		return;
	};

	let components = root
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()));

	if let Some(components) = components.as_object_mut() {
		let schemes = components
			.entry("securitySchemes")
			.or_insert_with(|| Value::Object(Map::new()));

		if let Some(schemes) = schemes.as_object_mut() {
			schemes.insert(
				"bearerAuth".to_string(),
				json!({
					"type": "http",
					"scheme": "bearer",
					"bearerFormat": "JWT"
				}),
			);
		}
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
