pub mod health;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::images;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(
            web::scope("/users")
                .app_data(web::PayloadConfig::new(images::AVATAR_MAX_BYTES))
                .service(users::register)
                .service(users::login)
                .service(users::logout)
                .service(users::logout_all)
                .service(users::me)
                .service(users::update_me)
                .service(users::delete_me)
                .service(users::set_avatar)
                .service(users::get_avatar)
                .service(users::delete_avatar),
        )
        .service(
            web::scope("/tasks")
                .app_data(web::PayloadConfig::new(images::IMAGE_MAX_BYTES))
                .service(tasks::list_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task)
                .service(tasks::set_image)
                .service(tasks::get_image)
                .service(tasks::delete_image),
        );
}
