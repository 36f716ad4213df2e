//! In-memory repository and media relay doubles used by unit and handler
//! tests. They mirror the constraints the real store enforces (unique
//! username/email, missing-row errors) closely enough for service logic.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::data::comment_repository::CommentRepository;
use crate::data::post_repository::{NewPost, PostChanges, PostRepository};
use crate::data::user_repository::{UserChanges, UserRepository};
use crate::domain::post::AuthorSnapshot;
use crate::domain::user::RegisterUserRequest;
use crate::domain::{Comment, DomainError, Post, User};
use crate::infrastructure::media::{ImageUpload, MediaRelay, StoredImage};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(
        &self,
        req: RegisterUserRequest,
        password_hash: String,
    ) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == req.username || u.email == req.email)
        {
            return Err(DomainError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            username: req.username,
            email: req.email,
            full_name: req.full_name,
            password_hash,
            profile_pic: None,
            cover_image: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<User, DomainError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, DomainError> {
        let mut users = self.users.lock().unwrap();

        if let Some(username) = &changes.username {
            if users.iter().any(|u| u.id != id && &u.username == username) {
                return Err(DomainError::UserAlreadyExists);
            }
        }
        if let Some(email) = &changes.email {
            if users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(DomainError::UserAlreadyExists);
            }
        }

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(DomainError::UserNotFound)?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(profile_pic) = changes.profile_pic {
            user.profile_pic = Some(profile_pic);
        }
        if let Some(cover_image) = changes.cover_image {
            user.cover_image = Some(cover_image);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list_all(&self) -> Result<Vec<User>, DomainError> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(users)
    }
}

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: Mutex<Vec<Post>>,
    next_id: AtomicI64,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self {
            posts: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn all(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, DomainError> {
        let now = Utc::now();
        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            title: new_post.title,
            short_description: new_post.short_description,
            content: new_post.content,
            author: new_post.author,
            image: new_post.image,
            views: 0,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn fetch_and_bump_views(&self, id: i64) -> Result<Post, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;
        post.views += 1;
        Ok(post.clone())
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DomainError::PostNotFound)?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(short_description) = changes.short_description {
            post.short_description = short_description;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(image) = changes.image {
            post.image = Some(image);
        }
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let before = posts.len();
        posts.retain(|p| p.id != id);
        if posts.len() == before {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list_page(&self, limit: i64, offset: i64) -> Result<(Vec<Post>, i64), DomainError> {
        let mut posts = self.posts.lock().unwrap().clone();
        let total = posts.len() as i64;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let page = posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn find_by_author(&self, author_id: i64) -> Result<Vec<Post>, DomainError> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.author.id == author_id)
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts)
    }

    async fn sync_author_snapshot(&self, author: &AuthorSnapshot) -> Result<u64, DomainError> {
        let mut posts = self.posts.lock().unwrap();
        let mut touched = 0;
        for post in posts.iter_mut().filter(|p| p.author.id == author.id) {
            post.author = author.clone();
            touched += 1;
        }
        Ok(touched)
    }
}

#[derive(Default)]
pub struct InMemoryCommentRepository {
    comments: Mutex<Vec<Comment>>,
    next_id: AtomicI64,
}

impl InMemoryCommentRepository {
    pub fn new() -> Self {
        Self {
            comments: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn create(
        &self,
        post_id: i64,
        commented_by: i64,
        body: String,
    ) -> Result<Comment, DomainError> {
        let comment = Comment {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            body,
            post_id,
            commented_by,
            created_at: Utc::now(),
        };
        self.comments.lock().unwrap().push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        self.comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(DomainError::CommentNotFound)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| c.id != id);
        if comments.len() == before {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>, DomainError> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }
}

/// Media relay double that records traffic instead of talking to the host.
/// Uploads yield predictable URLs so `public_id_from_url` round-trips.
#[derive(Default)]
pub struct RecordingMediaRelay {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: bool,
}

impl RecordingMediaRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_deletes() -> Self {
        Self {
            fail_deletes: true,
            ..Self::default()
        }
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaRelay for RecordingMediaRelay {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, DomainError> {
        let stem = image
            .file_name
            .split('.')
            .next()
            .unwrap_or(&image.file_name)
            .to_string();
        self.uploaded.lock().unwrap().push(image.file_name.clone());
        Ok(StoredImage {
            url: format!("https://media.test/uploads/{}", image.file_name),
            public_id: stem,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), DomainError> {
        if self.fail_deletes {
            return Err(DomainError::MediaError("host unavailable".to_string()));
        }
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}
