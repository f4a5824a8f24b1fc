//! Book repository.
//!
//! Writes that touch related entities (insert/update plus tag links) take
//! the caller's transaction; reads and counter updates run on the pool.

use maktaba_core::models::{Book, BookDetail};
use maktaba_core::AppError;
use sqlx::{PgPool, Postgres, Transaction};

use super::taxonomy;

/// Column values for a book insert/update after reference resolution. All
/// foreign keys are concrete row ids at this point.
#[derive(Debug)]
pub struct BookWrite<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub author_id: i64,
    pub category_id: i64,
    pub place_id: Option<i64>,
    pub language: Option<&'a str>,
    pub active: bool,
}

#[derive(Clone)]
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        write: &BookWrite<'_>,
    ) -> Result<Book, AppError> {
        let book = sqlx::query_as::<Postgres, Book>(
            "INSERT INTO books (title, description, author_id, category_id, place_id, language, active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING *",
        )
        .bind(write.title)
        .bind(write.description)
        .bind(write.author_id)
        .bind(write.category_id)
        .bind(write.place_id)
        .bind(write.language)
        .bind(write.active)
        .fetch_one(&mut **tx)
        .await?;
        Ok(book)
    }

    pub async fn update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        write: &BookWrite<'_>,
    ) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<Postgres, Book>(
            "UPDATE books SET title = $2, description = $3, author_id = $4, category_id = $5, \
             place_id = $6, language = $7, active = $8, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(write.title)
        .bind(write.description)
        .bind(write.author_id)
        .bind(write.category_id)
        .bind(write.place_id)
        .bind(write.language)
        .bind(write.active)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(book)
    }

    /// Replace the full tag set (set semantics: omitted tags are unlinked).
    pub async fn replace_tags(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        book_id: i64,
        tag_ids: &[i64],
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM book_tags WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;
        for tag_id in tag_ids {
            sqlx::query("INSERT INTO book_tags (book_id, tag_id) VALUES ($1, $2)")
                .bind(book_id)
                .bind(tag_id)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Book>, AppError> {
        let book = sqlx::query_as::<Postgres, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub async fn get_detail(&self, id: i64) -> Result<Option<BookDetail>, AppError> {
        let Some(book) = self.get(id).await? else {
            return Ok(None);
        };
        Ok(Some(self.build_detail(book).await?))
    }

    pub async fn list_details(&self) -> Result<Vec<BookDetail>, AppError> {
        let books = sqlx::query_as::<Postgres, Book>("SELECT * FROM books ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        if books.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = books.iter().map(|b| b.id).collect();
        let author_ids: Vec<i64> = books.iter().map(|b| b.author_id).collect();
        let category_ids: Vec<i64> = books.iter().map(|b| b.category_id).collect();
        let place_ids: Vec<i64> = books.iter().filter_map(|b| b.place_id).collect();

        let people = taxonomy::people_by_ids(&self.pool, &author_ids).await?;
        let categories = taxonomy::categories_by_ids(&self.pool, &category_ids).await?;
        let places = taxonomy::places_by_ids(&self.pool, &place_ids).await?;
        let mut tags = taxonomy::tags_for_books(&self.pool, &ids).await?;

        let mut details = Vec::with_capacity(books.len());
        for book in books {
            let author = people.get(&book.author_id).cloned().ok_or_else(|| {
                AppError::Internal(format!("Dangling author_id {} on book {}", book.author_id, book.id))
            })?;
            let category = categories.get(&book.category_id).cloned().ok_or_else(|| {
                AppError::Internal(format!(
                    "Dangling category_id {} on book {}",
                    book.category_id, book.id
                ))
            })?;
            let place = book.place_id.and_then(|id| places.get(&id).cloned());
            let book_tags = tags.remove(&book.id).unwrap_or_default();
            details.push(detail_from_parts(book, author, category, place, book_tags));
        }
        Ok(details)
    }

    async fn build_detail(&self, book: Book) -> Result<BookDetail, AppError> {
        let author = taxonomy::get_person(&self.pool, book.author_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Dangling author_id {} on book {}", book.author_id, book.id))
            })?;
        let category = taxonomy::get_category(&self.pool, book.category_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Dangling category_id {} on book {}",
                    book.category_id, book.id
                ))
            })?;
        let place = match book.place_id {
            Some(id) => taxonomy::get_place(&self.pool, id).await?,
            None => None,
        };
        let tags = taxonomy::tags_for_books(&self.pool, &[book.id])
            .await?
            .remove(&book.id)
            .unwrap_or_default();
        Ok(detail_from_parts(book, author, category, place, tags))
    }

    /// Record a newly stored file, returning the previous path (if any) so
    /// the caller can delete the replaced file best-effort.
    pub async fn set_file(
        &self,
        id: i64,
        file_path: &str,
        file_size: i64,
    ) -> Result<Option<String>, AppError> {
        let mut tx = self.pool.begin().await?;
        let old = sqlx::query_scalar::<Postgres, Option<String>>(
            "SELECT file_path FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query(
            "UPDATE books SET file_path = $2, file_size = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(file_path)
        .bind(file_size)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(old)
    }

    /// Delete the row, returning its stored file path for best-effort
    /// cleanup.
    pub async fn delete(&self, id: i64) -> Result<Option<String>, AppError> {
        let old = sqlx::query_scalar::<Postgres, Option<String>>(
            "DELETE FROM books WHERE id = $1 RETURNING file_path",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        Ok(old)
    }

    /// Bump the per-book and library-wide download counters. Callers treat
    /// this as fire-and-forget; an approximate count is acceptable.
    pub async fn increment_downloads(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE books SET downloads = downloads + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        sqlx::query("UPDATE stats SET total_downloads = total_downloads + 1 WHERE id = 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn detail_from_parts(
    book: Book,
    author: maktaba_core::models::Person,
    category: maktaba_core::models::Category,
    place: Option<maktaba_core::models::Place>,
    tags: Vec<maktaba_core::models::Tag>,
) -> BookDetail {
    BookDetail {
        id: book.id,
        title: book.title,
        description: book.description,
        author,
        category,
        place,
        tags,
        language: book.language,
        file_size: book.file_size,
        has_file: book.file_path.as_deref().is_some_and(|p| !p.is_empty()),
        downloads: book.downloads,
        active: book.active,
        created_at: book.created_at,
        updated_at: book.updated_at,
    }
}
