use paperclip::actix::web;

use crate::handlers;

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api")
                .service(
                    web::resource("/books")
                        .route(web::get().to(handlers::get_all_books))
                        .route(web::post().to(handlers::register_book)),
                )
                .service(
                    web::resource("/books/lookup").route(web::get().to(handlers::lookup_title)),
                )
                .service(
                    web::resource("/book/{book_id}").route(web::get().to(handlers::get_book)),
                )
                .service(web::resource("/loans").route(web::post().to(handlers::borrow_book)))
                .service(web::resource("/returns").route(web::post().to(handlers::return_book)))
                .service(
                    web::resource("/patron/{patron_id}/loans")
                        .route(web::get().to(handlers::get_patron_loans)),
                )
                .service(
                    web::resource("/librarians")
                        .route(web::get().to(handlers::get_librarians))
                        .route(web::post().to(handlers::appoint_librarian)),
                )
                .service(
                    web::resource("/librarians/transfer")
                        .route(web::post().to(handlers::transfer_librarian)),
                )
                .service(
                    web::resource("/librarian/{caller_id}")
                        .route(web::delete().to(handlers::dismiss_librarian)),
                ),
        );
}
