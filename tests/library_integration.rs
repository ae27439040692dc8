//! Integration tests for the library backend client.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bookshelf_core::library::{
    ApiError, BookDraft, BookFilter, BookPatch, BookStatus, FileTokenStore, LibraryClient,
    MemoryTokenStore, StatusFilter, TokenStore, compute_stats,
};
use bookshelf_core::{BookMetadata, HttpTimeouts};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn token_for(id: i64, name: &str, email: &str) -> String {
    let claims = json!({ "id": id, "nombre": name, "email": email });
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", URL_SAFE_NO_PAD.encode(claims.to_string()))
}

fn client(server: &MockServer, tokens: Arc<dyn TokenStore>) -> LibraryClient {
    LibraryClient::new(&server.uri(), tokens, &HttpTimeouts::new(2, 5)).unwrap()
}

fn book_json(id: i64, title: &str, author: &str, estado: &str, leido: bool) -> serde_json::Value {
    json!({
        "id": id,
        "usuario_id": 1,
        "titulo": title,
        "autor": author,
        "editorial": null,
        "anio_publicacion": 1967,
        "estado": estado,
        "leido": leido,
        "isbn": null,
        "portada_url": null,
        "fecha_registro": "2024-05-01T12:00:00.000Z"
    })
}

#[tokio::test]
async fn test_login_stores_token_and_sends_bearer_afterwards() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let token = token_for(7, "Ana", "ana@example.com");

    Mock::given(method("POST"))
        .and(path("/usuarios/login"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({ "email": "ana@example.com", "password": "pw" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": token })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/libros"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "libros": [book_json(1, "Cien años de soledad", "García Márquez", "en_estante", true)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileTokenStore::new(dir.path().join("bookshelf/token")));
    let client = client(&server, store.clone());

    let user = client.login("ana@example.com", "pw").await.unwrap();
    let user = user.expect("user decoded from token claims");
    assert_eq!(user.id, 7);
    assert_eq!(user.name, "Ana");
    assert_eq!(store.load().unwrap().as_deref(), Some(token.as_str()));
    assert!(client.is_authenticated().unwrap());
    assert_eq!(client.current_user().unwrap().map(|u| u.id), Some(7));

    let books = client.list_books().await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].title, "Cien años de soledad");
    assert!(books[0].read);

    client.logout().unwrap();
    assert!(!client.is_authenticated().unwrap());
}

#[tokio::test]
async fn test_login_failure_surfaces_backend_message() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/usuarios/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Credenciales inválidas" })),
        )
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let client = client(&server, store.clone());
    let err = client.login("x@example.com", "bad").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert!(err.to_string().contains("Credenciales inválidas"));
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_login_without_token_is_decode_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/usuarios/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::new()));
    let err = client.login("a@b.c", "pw").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_error_message_fallbacks() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/libros/1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Libro no encontrado" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/libros/2"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/libros/3"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_token("t")));

    let err = client.get_book(1).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(err.to_string().contains("Libro no encontrado"));

    let err = client.get_book(2).await.unwrap_err();
    assert!(err.to_string().contains("upstream exploded"));

    let err = client.get_book(3).await.unwrap_err();
    assert!(err.to_string().contains("HTTP error! status: 502"));
}

#[tokio::test]
async fn test_create_book_sends_spanish_fields() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/libros"))
        .and(header("authorization", "Bearer t"))
        .and(body_partial_json(json!({
            "titulo": "Effective Java",
            "autor": "Joshua Bloch",
            "anio_publicacion": 2017,
            "estado": "prestado",
            "leido": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Libro creado",
            "libro": book_json(9, "Effective Java", "Joshua Bloch", "prestado", false)
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut draft = BookDraft {
        status: BookStatus::Lent,
        ..BookDraft::default()
    };
    draft.apply_metadata(&BookMetadata {
        title: Some("Effective Java".into()),
        author: Some("Joshua Bloch".into()),
        year: Some(2017),
        ..BookMetadata::default()
    });

    let client = client(&server, Arc::new(MemoryTokenStore::with_token("t")));
    let created = client.create_book(&draft).await.unwrap();
    let created = created.expect("backend echoed the book");
    assert_eq!(created.id, 9);
    assert_eq!(created.status, BookStatus::Lent);
}

#[tokio::test]
async fn test_update_and_delete_book() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("PUT"))
        .and(path("/libros/4"))
        .and(body_partial_json(json!({ "leido": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/libros/4"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_token("t")));
    let patch = BookPatch {
        read: Some(true),
        ..BookPatch::default()
    };
    assert!(client.update_book(4, &patch).await.unwrap().is_none());
    client.delete_book(4).await.unwrap();
}

#[tokio::test]
async fn test_search_status_and_read_endpoints() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/libros/search"))
        .and(query_param("q", "garcía márquez"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "libros": [book_json(1, "Cien años de soledad", "García Márquez", "en_estante", true)]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/libros/estado/prestado"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "libros": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/libros/leido/false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "libros": [book_json(2, "Rayuela", "Cortázar", "otro", false)]
        })))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_token("t")));
    assert_eq!(client.search_books("garcía márquez").await.unwrap().len(), 1);
    assert!(client.books_by_status(BookStatus::Lent).await.unwrap().is_empty());
    let unread = client.books_by_read(false).await.unwrap();
    assert_eq!(unread[0].status, BookStatus::Other);
}

#[tokio::test]
async fn test_stats_match_local_counters() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    let books = json!([
        book_json(1, "A", "X", "en_estante", true),
        book_json(2, "B", "Y", "prestado", false),
        book_json(3, "C", "Z", "en_estante", false)
    ]);
    Mock::given(method("GET"))
        .and(path("/libros"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "libros": books })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/libros/stats/estadisticas"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "estadisticas": {
                "total_libros": "3",
                "libros_prestados": 1,
                "libros_en_estante": "2",
                "libros_leidos": 1,
                "libros_no_leidos": "2"
            }
        })))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_token("t")));
    let remote = client.stats().await.unwrap();
    let listed = client.list_books().await.unwrap();
    assert_eq!(remote, compute_stats(&listed));

    let filter = BookFilter {
        status: StatusFilter::OnShelf,
        search: Some("x".into()),
        media_type: None,
    };
    let shown = filter.apply(&listed);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, 1);
}

#[tokio::test]
async fn test_delete_account_clears_token() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("DELETE"))
        .and(path("/usuarios/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Cuenta eliminada" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_token("t"));
    let client = client(&server, store.clone());
    client.delete_account().await.unwrap();
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn test_profile_wrapped_user() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/usuarios/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "usuario": { "id": 3, "nombre": "Luis", "email": "luis@example.com", "fecha_creacion": "2024-01-01" }
        })))
        .mount(&server)
        .await;

    let client = client(&server, Arc::new(MemoryTokenStore::with_token("t")));
    let user = client.profile().await.unwrap();
    assert_eq!(user.name, "Luis");
    assert_eq!(user.created_at.as_deref(), Some("2024-01-01"));
}
