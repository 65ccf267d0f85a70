use std::convert::Infallible;
use std::sync::Arc;
use serde::{Serialize, Deserialize};
use warp::http::StatusCode;
use warp::Filter;

use crate::protocol::{self, ProtocolError, Reconciler, UpdateRequest};
use crate::store::RecordStore;

/// Wire shape of the patient-id listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdListing {
    #[serde(rename = "ID")]
    pub ids: Vec<i64>,
}

pub struct RestApi {
    reconciler: Arc<Reconciler>,
    store: Arc<dyn RecordStore>,
}

impl RestApi {
    pub fn new(reconciler: Arc<Reconciler>, store: Arc<dyn RecordStore>) -> Self {
        RestApi { reconciler, store }
    }

    pub fn routes(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        self.status()
            .or(self.new_patient())
            .or(self.patient_list())
            .or(self.patient_by_id())
    }

    /// `GET /` — liveness probe.
    fn status(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        warp::path::end()
            .and(warp::get())
            .map(|| "Server is on")
    }

    /// `POST /api/new_patient` — registration and uploads.
    ///
    /// Plain-text response: the reconciliation message with 200, or the
    /// validation message with 400.
    fn new_patient(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let reconciler = Arc::clone(&self.reconciler);
        let store = Arc::clone(&self.store);

        warp::path!("api" / "new_patient")
            .and(warp::post())
            .and(warp::body::json())
            .and_then(move |request: UpdateRequest| {
                let reconciler = Arc::clone(&reconciler);
                let store = Arc::clone(&store);
                async move {
                    let (message, status) = match reconciler.apply(&request, store.as_ref()) {
                        Ok((message, _outcome)) => (message, StatusCode::OK),
                        Err(ProtocolError::Validation(message)) => {
                            (message, StatusCode::BAD_REQUEST)
                        }
                        Err(err) => (err.to_string(), StatusCode::INTERNAL_SERVER_ERROR),
                    };
                    Ok::<_, Infallible>(warp::reply::with_status(message, status))
                }
            })
    }

    /// `GET /api/get_patient` — every stored medical record number.
    fn patient_list(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let store = Arc::clone(&self.store);

        warp::path!("api" / "get_patient")
            .and(warp::get())
            .and_then(move || {
                let store = Arc::clone(&store);
                async move {
                    let reply = match protocol::list_keys(store.as_ref()) {
                        Ok(ids) => warp::reply::with_status(
                            warp::reply::json(&IdListing { ids }),
                            StatusCode::OK,
                        ),
                        Err(err) => warp::reply::with_status(
                            warp::reply::json(&err.to_string()),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ),
                    };
                    Ok::<_, Infallible>(reply)
                }
            })
    }

    /// `GET /api/get_patient/<id>` — one patient's full record.
    fn patient_by_id(&self) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
        let store = Arc::clone(&self.store);

        warp::path!("api" / "get_patient" / String)
            .and(warp::get())
            .and_then(move |id: String| {
                let store = Arc::clone(&store);
                async move {
                    let reply = match protocol::get_patient(&id, store.as_ref()) {
                        Ok(report) => warp::reply::with_status(
                            warp::reply::json(&report),
                            StatusCode::OK,
                        ),
                        Err(err @ ProtocolError::Validation(_))
                        | Err(err @ ProtocolError::NotFound(_)) => warp::reply::with_status(
                            warp::reply::json(&err.to_string()),
                            StatusCode::BAD_REQUEST,
                        ),
                        Err(err) => warp::reply::with_status(
                            warp::reply::json(&err.to_string()),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        ),
                    };
                    Ok::<_, Infallible>(reply)
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PatientReport;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn test_api() -> RestApi {
        RestApi::new(
            Arc::new(Reconciler::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    #[tokio::test]
    async fn status_route_reports_the_server_is_on() {
        let api = test_api();
        let resp = warp::test::request()
            .method("GET")
            .path("/")
            .reply(&api.routes())
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), "Server is on");
    }

    #[tokio::test]
    async fn new_patient_registers_then_reports_no_change() {
        let api = test_api();
        let routes = api.routes();

        let resp = warp::test::request()
            .method("POST")
            .path("/api/new_patient")
            .json(&serde_json::json!({
                "name": "Ann Ables",
                "medical_record_number": 1,
                "medical_image": "",
                "ecg_image": "",
                "hr": 0
            }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), "New patient ID 1 is registered");

        let resp = warp::test::request()
            .method("POST")
            .path("/api/new_patient")
            .json(&serde_json::json!({
                "name": "",
                "medical_record_number": "1",
                "medical_image": "",
                "ecg_image": "",
                "hr": 0
            }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.body(), "No further updates for Patient ID 1");
    }

    #[tokio::test]
    async fn new_patient_rejects_bad_ids_with_400() {
        let api = test_api();
        let routes = api.routes();

        let resp = warp::test::request()
            .method("POST")
            .path("/api/new_patient")
            .json(&serde_json::json!({
                "name": "Bob",
                "medical_record_number": "",
                "medical_image": "",
                "ecg_image": "",
                "hr": 0
            }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = warp::test::request()
            .method("POST")
            .path("/api/new_patient")
            .json(&serde_json::json!({
                "name": "",
                "medical_record_number": "8jfh",
                "medical_image": "",
                "ecg_image": "",
                "hr": 0
            }))
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.body(),
            "The input 8jfh cannot be converted into integer"
        );
    }

    #[tokio::test]
    async fn patient_list_returns_every_id() {
        let api = test_api();
        let routes = api.routes();

        for key in [1, 2, 3] {
            warp::test::request()
                .method("POST")
                .path("/api/new_patient")
                .json(&serde_json::json!({ "medical_record_number": key }))
                .reply(&routes)
                .await;
        }

        let resp = warp::test::request()
            .method("GET")
            .path("/api/get_patient")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let listing: IdListing = serde_json::from_slice(resp.body()).unwrap();
        let mut ids = listing.ids;
        ids.sort();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn patient_by_id_round_trips_the_record() {
        let api = test_api();
        let routes = api.routes();

        warp::test::request()
            .method("POST")
            .path("/api/new_patient")
            .json(&serde_json::json!({
                "name": "TS",
                "medical_record_number": 118,
                "medical_image": "",
                "ecg_image": "X",
                "hr": 90
            }))
            .reply(&routes)
            .await;

        let resp = warp::test::request()
            .method("GET")
            .path("/api/get_patient/118")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::OK);

        let report: PatientReport = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(report.name, "TS");
        assert_eq!(report.id, 118);
        assert_eq!(report.ecg_image, vec!["X".to_string()]);
        assert_eq!(report.heart_rate, vec![90]);
    }

    #[tokio::test]
    async fn patient_by_id_rejects_unknown_and_malformed_ids() {
        let api = test_api();
        let routes = api.routes();

        let resp = warp::test::request()
            .method("GET")
            .path("/api/get_patient/42")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = warp::test::request()
            .method("GET")
            .path("/api/get_patient/u83")
            .reply(&routes)
            .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
