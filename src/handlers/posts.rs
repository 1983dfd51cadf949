use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde_json::json;
use validator::Validate;

use crate::{
    middleware::{auth, SessionAuth},
    models::{
        documents::{DocumentList, FileUpload},
        posts::{LikePostDto, NewPost, Post, PostFormDto, PostListResponseDto, UpdatePost},
        query::{DeletePostQueryDto, InfinitePostsQueryDto, SearchPostsQueryDto},
        response::Response,
    },
    services::feed::INFINITE_PAGE_SIZE,
    AppState, Error, Result,
};

pub fn posts_handler() -> Router {
    Router::new()
        .route("/", get(get_infinite_posts).post(create_post))
        .route("/recent", get(get_recent_posts))
        .route("/search", get(search_posts))
        .route(
            "/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/{id}/likes", put(like_post))
        .route("/{id}/save", post(save_post))
        .layer(middleware::from_fn(auth))
}

pub fn saves_handler() -> Router {
    Router::new()
        .route("/{id}", delete(delete_saved_post))
        .layer(middleware::from_fn(auth))
}

/// Text fields plus attached files of a post form.
struct PostForm {
    fields: PostFormDto,
    files: Vec<FileUpload>,
}

async fn read_post_form(mut multipart: Multipart, max_upload_bytes: usize) -> Result<PostForm> {
    let mut fields = PostFormDto::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let file_name = field.file_name().unwrap_or("upload").to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;

            if bytes.len() > max_upload_bytes {
                return Err(Error::BadRequest(format!(
                    "File {file_name} exceeds {max_upload_bytes} bytes"
                )));
            }

            let upload = FileUpload {
                name: file_name,
                mime_type,
                bytes: bytes.to_vec(),
            };
            upload.ensure_image()?;
            files.push(upload);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;
        let optional = Some(value.clone()).filter(|v| !v.trim().is_empty());

        match name.as_str() {
            "caption" => fields.caption = value,
            "location" => fields.location = optional,
            "tags" => fields.tags = optional,
            "imageId" => fields.image_id = optional,
            "imageUrl" => fields.image_url = optional,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    fields.validate()?;
    Ok(PostForm { fields, files })
}

fn list_response(list: DocumentList<Post>, page_size: Option<u32>) -> PostListResponseDto {
    let next_cursor = match page_size {
        Some(size) if list.documents.len() == size as usize => {
            list.documents.last().map(|post| post.id.clone())
        }
        _ => None,
    };

    PostListResponseDto {
        status: "success".to_string(),
        total: list.total,
        posts: list.documents,
        next_cursor,
    }
}

/// Loads the post and checks that the caller created it.
async fn owned_post(app_state: &AppState, auth: &SessionAuth, post_id: &str) -> Result<Post> {
    let post = app_state.post_service.get_post_by_id(post_id).await?;

    if post.creator.id() != auth.user.id {
        return Err(Error::Forbidden);
    }

    Ok(post)
}

async fn get_recent_posts(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse> {
    let posts = app_state.feed_service.get_recent_posts().await?;
    Ok(Json(list_response(posts, None)))
}

async fn get_infinite_posts(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<InfinitePostsQueryDto>,
) -> Result<impl IntoResponse> {
    let posts = app_state
        .feed_service
        .get_infinite_posts(params.cursor.as_deref())
        .await?;

    Ok(Json(list_response(posts, Some(INFINITE_PAGE_SIZE))))
}

async fn search_posts(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<SearchPostsQueryDto>,
) -> Result<impl IntoResponse> {
    let posts = app_state.feed_service.search_posts(&params.q).await?;
    Ok(Json(list_response(posts, None)))
}

async fn get_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse> {
    let post = app_state.post_service.get_post_by_id(&post_id).await?;
    Ok(Json(post))
}

async fn create_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<SessionAuth>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_post_form(multipart, app_state.config.max_upload_bytes).await?;

    let post = app_state
        .post_service
        .create_post(NewPost {
            user_id: auth.user.id,
            caption: form.fields.caption,
            files: form.files,
            location: form.fields.location,
            tags: form.fields.tags,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<SessionAuth>,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_post_form(multipart, app_state.config.max_upload_bytes).await?;
    let current = owned_post(&app_state, &auth, &post_id).await?;

    let updated = app_state
        .post_service
        .update_post(UpdatePost {
            post_id,
            caption: form.fields.caption,
            image_id: form.fields.image_id.unwrap_or(current.image_id),
            image_url: form.fields.image_url.unwrap_or(current.image_url),
            files: form.files,
            location: form.fields.location,
            tags: form.fields.tags,
        })
        .await?;

    Ok(Json(updated))
}

async fn delete_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<SessionAuth>,
    Path(post_id): Path<String>,
    Query(params): Query<DeletePostQueryDto>,
) -> Result<impl IntoResponse> {
    let image_id = params.image_id.unwrap_or_default();
    if !image_id.is_empty() {
        owned_post(&app_state, &auth, &post_id).await?;
    }

    app_state
        .post_service
        .delete_post(&post_id, &image_id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Post deleted".to_string(),
    }))
}

async fn like_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(post_id): Path<String>,
    Json(body): Json<LikePostDto>,
) -> Result<impl IntoResponse> {
    let post = app_state
        .feed_service
        .like_post(&post_id, &body.likes)
        .await?;

    Ok(Json(post))
}

async fn save_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<SessionAuth>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse> {
    let saved = app_state
        .feed_service
        .save_post(&post_id, &auth.user.id)
        .await?;

    Ok((StatusCode::CREATED, Json(saved)))
}

async fn delete_saved_post(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(saved_id): Path<String>,
) -> Result<impl IntoResponse> {
    app_state.feed_service.delete_saved_post(&saved_id).await?;

    Ok(Json(json!({ "status": "success" })))
}
