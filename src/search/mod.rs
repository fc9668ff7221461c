//! Tantivy-based search index module.
//!
//! Full-text search over saved content. Every query is restricted to the
//! owner's documents, optionally narrowed to one content type.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::{ContentType, SavedContent};

/// Field boost values.
const BOOST_TITLE: f32 = 3.0;
const BOOST_BODY: f32 = 1.0;
const BOOST_PLATFORM: f32 = 0.5;

/// Search result with content id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub content_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    content_id: Field,
    owner_id: Field,
    content_type: Field,
    title: Field,
    body: Field,
    platform: Field,
}

/// Tantivy search index for saved content.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        // Define schema
        let mut schema_builder = Schema::builder();
        let content_id = schema_builder.add_text_field("content_id", STRING | STORED);
        let owner_id = schema_builder.add_text_field("owner_id", STRING);
        let content_type = schema_builder.add_text_field("content_type", STRING);
        let title = schema_builder.add_text_field("title", TEXT);
        let body = schema_builder.add_text_field("body", TEXT);
        let platform = schema_builder.add_text_field("platform", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            content_id,
            owner_id,
            content_type,
            title,
            body,
            platform,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index from saved content.
    pub async fn rebuild(&self, contents: &[SavedContent]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_all_documents()?;
        for content in contents {
            writer.add_document(self.create_document(content))?;
        }
        writer.commit()?;

        self.reader.reload()?;

        tracing::info!("Search index rebuilt with {} items", contents.len());
        Ok(())
    }

    /// Index a single saved item.
    pub async fn index_content(&self, content: &SavedContent) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.content_id, &content.id));
        writer.add_document(self.create_document(content))?;
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a saved item from the index.
    pub async fn remove_content(&self, content_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        writer.delete_term(Term::from_field_text(self.fields.content_id, content_id));
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search one owner's content.
    pub fn search(
        &self,
        owner_id: &str,
        query_str: &str,
        content_type: Option<ContentType>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        if query_str.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        // Field-specific boosted queries, OR-ed together
        let field_queries = [
            (self.fields.title, BOOST_TITLE),
            (self.fields.body, BOOST_BODY),
            (self.fields.platform, BOOST_PLATFORM),
        ];

        let mut text_queries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in field_queries {
            let field_parser = QueryParser::for_index(&self.index, vec![field]);
            if let Ok(field_query) = field_parser.parse_query(query_str) {
                text_queries.push((Occur::Should, Box::new(BoostQuery::new(field_query, boost))));
            }
        }

        if text_queries.is_empty() {
            return Err(AppError::Validation(format!(
                "Invalid search query: {}",
                query_str
            )));
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        clauses.push((Occur::Must, Box::new(BooleanQuery::new(text_queries))));
        clauses.push((Occur::Must, self.term_query(self.fields.owner_id, owner_id)));
        if let Some(content_type) = content_type {
            clauses.push((
                Occur::Must,
                self.term_query(self.fields.content_type, content_type.as_str()),
            ));
        }
        let combined_query = BooleanQuery::new(clauses);

        // Execute search with pagination
        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit + offset))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results: Vec<SearchResult> = top_docs
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let content_id = doc.get_first(self.fields.content_id)?.as_str()?.to_string();
                Some(SearchResult { content_id, score })
            })
            .collect();

        Ok(results)
    }

    fn term_query(&self, field: Field, value: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(field, value),
            IndexRecordOption::Basic,
        ))
    }

    /// Create a Tantivy document from a saved item.
    fn create_document(&self, content: &SavedContent) -> TantivyDocument {
        doc!(
            self.fields.content_id => content.id.clone(),
            self.fields.owner_id => content.user_id.clone(),
            self.fields.content_type => content.content_type.as_str().to_string(),
            self.fields.title => content.title.clone(),
            self.fields.body => content.content.clone(),
            self.fields.platform => content.platform.clone()
        )
    }
}
