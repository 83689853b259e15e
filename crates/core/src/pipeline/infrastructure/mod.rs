pub mod threaded_translate_worker;
