use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{NewsClientError, NewsClientResult};
use crate::models::{ListFilter, ListPostsResponse, NewPost, Post, PostPatch};

#[derive(Debug, Serialize)]
struct UpdatePostRequestDto<'a> {
    id: Uuid,
    #[serde(flatten)]
    patch: &'a PostPatch,
}

#[derive(Debug, Serialize)]
struct PostRefDto {
    id: Uuid,
}

#[derive(Debug, Serialize)]
struct ReorderRequestDto {
    posts: Vec<PostRefDto>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PostDto {
    id: Uuid,
    title: String,
    author: String,
    #[serde(default)]
    content: String,
    image_url: Option<String>,
    #[serde(default)]
    is_pinned: bool,
    #[serde(default)]
    published: bool,
    #[serde(default)]
    deleted: bool,
    display_order: Option<i32>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
struct PostEnvelopeDto {
    post: PostDto,
}

#[derive(Debug, Deserialize)]
struct ListPostsResponseDto {
    #[serde(default)]
    posts: Vec<PostDto>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuccessDto {
    success: bool,
}

#[derive(Debug, Deserialize)]
struct UploadResponseDto {
    url: String,
}

impl From<PostDto> for Post {
    fn from(value: PostDto) -> Self {
        Self {
            id: value.id,
            title: value.title,
            author: value.author,
            content: value.content,
            image_url: value.image_url,
            is_pinned: value.is_pinned,
            published: value.published,
            deleted: value.deleted,
            display_order: value.display_order,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<ListPostsResponseDto> for ListPostsResponse {
    fn from(value: ListPostsResponseDto) -> Self {
        Self {
            posts: value.posts.into_iter().map(Post::from).collect(),
            error: value.error,
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP client for the `news-server` REST API.
pub(crate) struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    pub(crate) fn new(base_url: impl Into<String>) -> NewsClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn decode_error(response: reqwest::Response) -> NewsClientError {
        let status = response.status();

        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body
                .error
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        NewsClientError::from_http_status(status, Some(message))
    }

    async fn read_json<TRes>(response: reqwest::Response) -> NewsClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(NewsClientError::from_reqwest)
    }

    /// shared helper for requests with a json payload
    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: &str,
    ) -> NewsClientResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let response = self
            .client
            .request(method, self.endpoint(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(NewsClientError::from_reqwest)?;

        Self::read_json(response).await
    }

    pub(crate) async fn list_posts(&self, filter: ListFilter) -> NewsClientResult<ListPostsResponse> {
        let response = self
            .client
            .request(Method::GET, self.endpoint("/api/news"))
            .query(&filter.query())
            .send()
            .await
            .map_err(NewsClientError::from_reqwest)?;

        let dto: ListPostsResponseDto = Self::read_json(response).await?;
        Ok(dto.into())
    }

    pub(crate) async fn create_post(&self, token: &str, post: &NewPost) -> NewsClientResult<Post> {
        let dto: PostEnvelopeDto = self
            .send_json(Method::POST, "/api/news", post, token)
            .await?;
        Ok(dto.post.into())
    }

    pub(crate) async fn update_post(
        &self,
        token: &str,
        id: Uuid,
        patch: &PostPatch,
    ) -> NewsClientResult<Post> {
        let payload = UpdatePostRequestDto { id, patch };
        let dto: PostEnvelopeDto = self
            .send_json(Method::PUT, "/api/news", &payload, token)
            .await?;
        Ok(dto.post.into())
    }

    pub(crate) async fn delete_post(&self, token: &str, id: Uuid) -> NewsClientResult<()> {
        let response = self
            .client
            .request(Method::DELETE, self.endpoint("/api/news"))
            .query(&[("id", id.to_string())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(NewsClientError::from_reqwest)?;

        let dto: SuccessDto = Self::read_json(response).await?;
        expect_success(dto)
    }

    pub(crate) async fn reorder_posts(&self, token: &str, ids: &[Uuid]) -> NewsClientResult<()> {
        let payload = ReorderRequestDto {
            posts: ids.iter().map(|id| PostRefDto { id: *id }).collect(),
        };
        let dto: SuccessDto = self
            .send_json(Method::POST, "/api/news/reorder", &payload, token)
            .await?;
        expect_success(dto)
    }

    pub(crate) async fn upload_image(
        &self,
        token: &str,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> NewsClientResult<String> {
        let part = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .request(Method::POST, self.endpoint("/api/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(NewsClientError::from_reqwest)?;

        let dto: UploadResponseDto = Self::read_json(response).await?;
        Ok(dto.url)
    }
}

fn expect_success(dto: SuccessDto) -> NewsClientResult<()> {
    if dto.success {
        Ok(())
    } else {
        Err(NewsClientError::Server(
            "server did not confirm the operation".to_string(),
        ))
    }
}
